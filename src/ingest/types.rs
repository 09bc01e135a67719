// src/ingest/types.rs
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// One scraped headline/link/date unit. Created by a provider, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Story {
    pub headline: String,
    pub link: String,
    pub date_posted: String, // ISO-8601, as supplied by the provider
}

/// Where to look for stories: a page URL or an X profile (URL or `@handle`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// X profile. `handle` is `None` when the URL has no profile segment.
    Social { handle: Option<String> },
    Web,
}

const SOCIAL_HOSTS: &[&str] = &[
    "x.com",
    "www.x.com",
    "mobile.x.com",
    "twitter.com",
    "www.twitter.com",
    "mobile.twitter.com",
];

impl Source {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into().trim().to_string(),
        }
    }

    /// Derive the source kind from the identifier.
    pub fn kind(&self) -> SourceKind {
        let id = self.identifier.as_str();

        if let Some(handle) = id.strip_prefix('@') {
            return SourceKind::Social {
                handle: valid_handle(handle),
            };
        }

        match self.url() {
            Some(url) => {
                let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
                if SOCIAL_HOSTS.contains(&host.as_str()) {
                    let handle = url
                        .path_segments()
                        .and_then(|mut segs| segs.find(|s| !s.is_empty()))
                        .and_then(valid_handle);
                    SourceKind::Social { handle }
                } else {
                    SourceKind::Web
                }
            }
            None => SourceKind::Web,
        }
    }

    /// Identifier as an absolute http(s) URL. Schemeless identifiers
    /// (`x.com/OpenAI`, `openai.com/news/`) are read as `https://`.
    pub fn url(&self) -> Option<Url> {
        let id = self.identifier.as_str();
        if id.is_empty() || id.starts_with('@') {
            return None;
        }
        match Url::parse(id) {
            Ok(url) if url.has_host() => Some(url),
            Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) if !id.contains("://") => {
                Url::parse(&format!("https://{id}"))
                    .ok()
                    .filter(|u| u.has_host())
            }
            _ => None,
        }
    }
}

fn valid_handle(s: &str) -> Option<String> {
    let ok = !s.is_empty()
        && s.len() <= 15
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    ok.then(|| s.to_string())
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

impl From<&str> for Source {
    fn from(s: &str) -> Self {
        Source::new(s)
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Source::new(s)
    }
}

/// Per-source failure. Always isolated: the source contributes zero stories.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("rate limited by provider")]
    RateLimited,

    #[error("provider returned HTTP {status}")]
    Http { status: u16 },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not decode provider payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected payload shape: {0}")]
    Shape(String),

    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("missing credentials for {0}")]
    MissingCredentials(&'static str),

    #[error("invalid source identifier: {0}")]
    InvalidSource(String),
}

impl FetchError {
    /// Short label used as a metrics dimension.
    pub fn kind_label(&self) -> &'static str {
        match self {
            FetchError::RateLimited => "rate_limited",
            FetchError::Http { .. } => "http",
            FetchError::Transport(_) => "transport",
            FetchError::Decode(_) => "decode",
            FetchError::Shape(_) => "shape",
            FetchError::ExtractionFailed(_) => "extraction_failed",
            FetchError::Timeout(_) => "timeout",
            FetchError::MissingCredentials(_) => "missing_credentials",
            FetchError::InvalidSource(_) => "invalid_source",
        }
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_stories(&self, source: &Source) -> Result<Vec<Story>, FetchError>;
    fn name(&self) -> &'static str;
}
