// src/ingest/providers/firecrawl.rs
//! Firecrawl `/v1/extract` adapter: schema-guided extraction of today's stories from a page.
//!
//! The extract endpoint either answers inline (`data` present) or hands back a job id.
//! Jobs are polled at `poll_interval` until they complete, fail, or `max_polls` runs out.
//! Whatever comes back is decoded strictly into `{stories: [{headline, link, date_posted}]}`;
//! anything else is a shape error and the source is skipped.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use super::decode_response;
use crate::ingest::types::{FetchError, Source, SourceProvider, Story};

pub const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev";
pub const DEFAULT_TOPIC: &str = "AI or LLM";

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    urls: Vec<&'a str>,
    prompt: String,
    schema: Value,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    success: Option<bool>,
    data: Option<Value>,
    error: Option<String>,
    id: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StoriesPayload {
    stories: Vec<RawStory>,
}

#[derive(Debug, Deserialize)]
struct RawStory {
    headline: String,
    link: String,
    date_posted: String,
}

pub struct FirecrawlProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    topic: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl FirecrawlProvider {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            poll_interval: Duration::from_secs(2),
            max_polls: 45,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls.max(1);
        self
    }

    async fn poll_job(&self, id: &str) -> Result<Value, FetchError> {
        let url = format!("{}/v1/extract/{}", self.base_url, id);
        for _ in 0..self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let resp = self
                .http
                .get(&url)
                .bearer_auth(&self.api_key)
                .send()
                .await?;
            let job: ExtractResponse = decode_response(resp).await?;
            if job.success == Some(false) {
                return Err(FetchError::ExtractionFailed(
                    job.error.unwrap_or_else(|| "unknown error".into()),
                ));
            }

            let status = job.status.unwrap_or_default();
            match status.as_str() {
                "completed" => {
                    return job
                        .data
                        .ok_or_else(|| FetchError::Shape("completed job has no data".into()))
                }
                "failed" | "cancelled" => {
                    let reason = job.error.unwrap_or_else(|| status.clone());
                    return Err(FetchError::ExtractionFailed(reason));
                }
                _ => tracing::trace!(job = id, status = %status, "extract job pending"),
            }
        }
        Err(FetchError::ExtractionFailed(format!(
            "job {id} did not complete after {} polls",
            self.max_polls
        )))
    }
}

/// Natural-language instruction sent with every extract request.
pub fn build_prompt(topic: &str, source: &str, today: &str) -> String {
    format!(
        r#"Return only today's {topic} related story or post headlines and links in JSON format from the page content.
They must be posted today, {today}. The format should be:
{{
  "stories": [
    {{
      "headline": "headline1",
      "link": "link1",
      "date_posted": "YYYY-MM-DD"
    }},
    ...
  ]
}}
If there are no {topic} stories from today, return {{"stories": []}}.

The source link is {source}.
If a story link is not absolute, prepend {source} to make it absolute.
Return only pure JSON in the specified format (no extra text, no markdown, no ```)."#
    )
}

/// JSON schema mirroring the stories payload.
pub fn stories_schema(topic: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "stories": {
                "type": "array",
                "description": format!("A list of today's {topic}-related stories"),
                "items": {
                    "type": "object",
                    "properties": {
                        "headline": { "type": "string", "description": "Story or post headline" },
                        "link": { "type": "string", "description": "A link to the post or story" },
                        "date_posted": { "type": "string", "description": "The date the story or post was published" }
                    },
                    "required": ["headline", "link", "date_posted"]
                }
            }
        },
        "required": ["stories"]
    })
}

/// Strict decode of the extraction payload plus per-entry cleanup.
/// Entries with an empty field are dropped; links are resolved against `base`.
fn decode_stories(data: Value, base: &Url) -> Result<Vec<Story>, FetchError> {
    if data.get("stories").is_none() {
        return Err(FetchError::Shape(
            "extracted data does not have a \"stories\" key".into(),
        ));
    }
    let payload: StoriesPayload = serde_json::from_value(data)
        .map_err(|e| FetchError::Shape(format!("malformed stories payload: {e}")))?;

    let mut out = Vec::with_capacity(payload.stories.len());
    for raw in payload.stories {
        let headline = raw.headline.trim();
        let link = raw.link.trim();
        let date_posted = raw.date_posted.trim();
        if headline.is_empty() || link.is_empty() || date_posted.is_empty() {
            tracing::debug!(headline, link, "dropping incomplete story");
            continue;
        }
        let Ok(abs) = base.join(link) else {
            tracing::debug!(link, "dropping story with unresolvable link");
            continue;
        };
        out.push(Story {
            headline: headline.to_string(),
            link: abs.to_string(),
            date_posted: date_posted.to_string(),
        });
    }
    Ok(out)
}

#[async_trait]
impl SourceProvider for FirecrawlProvider {
    async fn fetch_stories(&self, source: &Source) -> Result<Vec<Story>, FetchError> {
        if self.api_key.is_empty() {
            return Err(FetchError::MissingCredentials("firecrawl"));
        }
        let base = source
            .url()
            .ok_or_else(|| FetchError::InvalidSource(source.identifier.clone()))?;

        let today = Local::now().format("%Y-%m-%d").to_string();
        let req = ExtractRequest {
            urls: vec![base.as_str()],
            prompt: build_prompt(&self.topic, base.as_str(), &today),
            schema: stories_schema(&self.topic),
        };

        let resp = self
            .http
            .post(format!("{}/v1/extract", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;
        let envelope: ExtractResponse = decode_response(resp).await?;

        if envelope.success == Some(false) {
            return Err(FetchError::ExtractionFailed(
                envelope.error.unwrap_or_else(|| "unknown error".into()),
            ));
        }

        let data = match (envelope.data, envelope.id) {
            (Some(data), _) => data,
            (None, Some(id)) => self.poll_job(&id).await?,
            (None, None) => {
                return Err(FetchError::Shape(
                    "extract response has neither data nor job id".into(),
                ))
            }
        };

        decode_stories(data, &base)
    }

    fn name(&self) -> &'static str {
        "firecrawl"
    }
}
