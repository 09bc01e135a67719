// src/ingest/providers/x_search.rs
//! X (Twitter) recent-search adapter: one search call per profile source.

use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use metrics::counter;
use serde::Deserialize;

use super::decode_response;
use crate::ingest::types::{FetchError, Source, SourceKind, SourceProvider, Story};

pub const DEFAULT_BASE_URL: &str = "https://api.x.com";
const SEARCH_PATH: &str = "/2/tweets/search/recent";
const MAX_RESULTS: u32 = 10;
const LOOKBACK_HOURS: i64 = 24;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Option<Vec<Post>>,
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct Meta {
    #[serde(default)]
    result_count: u64,
}

pub struct XSearchProvider {
    http: reqwest::Client,
    bearer: String,
    base_url: String,
    max_results: u32,
    lookback: Duration,
}

impl XSearchProvider {
    pub fn new(http: reqwest::Client, bearer: impl Into<String>) -> Self {
        Self {
            http,
            bearer: bearer.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_results: MAX_RESULTS,
            lookback: Duration::hours(LOOKBACK_HOURS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_results(mut self, n: u32) -> Self {
        // X rejects max_results outside 10..=100
        self.max_results = n.clamp(10, 100);
        self
    }
}

/// Original posts with media from `handle`; retweets and replies excluded.
pub fn build_query(handle: &str) -> String {
    format!("from:{handle} has:media -is:retweet -is:reply")
}

pub fn permalink(post_id: &str) -> String {
    format!("https://x.com/i/status/{post_id}")
}

#[async_trait]
impl SourceProvider for XSearchProvider {
    async fn fetch_stories(&self, source: &Source) -> Result<Vec<Story>, FetchError> {
        let handle = match source.kind() {
            SourceKind::Social {
                handle: Some(handle),
            } => handle,
            _ => return Err(FetchError::InvalidSource(source.identifier.clone())),
        };
        if self.bearer.is_empty() {
            return Err(FetchError::MissingCredentials("x"));
        }

        let start_time = (Utc::now() - self.lookback).to_rfc3339_opts(SecondsFormat::Millis, true);
        let url = format!("{}{}", self.base_url, SEARCH_PATH);

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("query", build_query(&handle)),
                ("max_results", self.max_results.to_string()),
                ("start_time", start_time.clone()),
            ])
            .bearer_auth(&self.bearer)
            .send()
            .await?;
        let body: SearchResponse = decode_response(resp).await?;

        if body.meta.as_ref().map(|m| m.result_count) == Some(0) {
            tracing::info!(handle = %handle, "no posts found");
            return Ok(Vec::new());
        }

        let posts = body
            .data
            .ok_or_else(|| FetchError::Shape("expected `data` to be an array of posts".into()))?;

        let stories: Vec<Story> = posts
            .into_iter()
            .filter_map(|p| {
                let text = html_escape::decode_html_entities(&p.text).trim().to_string();
                if text.is_empty() || p.id.is_empty() {
                    return None;
                }
                Some(Story {
                    headline: text,
                    link: permalink(&p.id),
                    date_posted: start_time.clone(),
                })
            })
            .collect();

        counter!("scrape_posts_total").increment(stories.len() as u64);
        tracing::debug!(handle = %handle, count = stories.len(), "posts found");
        Ok(stories)
    }

    fn name(&self) -> &'static str {
        "x"
    }
}
