// src/ingest/providers/mod.rs
pub mod firecrawl;
pub mod x_search;

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::ingest::types::{FetchError, Source, SourceKind, SourceProvider};

/// Routes each source to the adapter for its kind.
#[derive(Clone)]
pub struct ProviderSet {
    social: Arc<dyn SourceProvider>,
    web: Arc<dyn SourceProvider>,
}

impl ProviderSet {
    pub fn new(social: Arc<dyn SourceProvider>, web: Arc<dyn SourceProvider>) -> Self {
        Self { social, web }
    }

    pub fn for_source(&self, source: &Source) -> &dyn SourceProvider {
        match source.kind() {
            SourceKind::Social { .. } => self.social.as_ref(),
            SourceKind::Web => self.web.as_ref(),
        }
    }
}

/// Map the HTTP status to a `FetchError` and decode the JSON body.
/// 429 is reported as `RateLimited` so callers can log it apart from other failures.
pub(crate) async fn decode_response<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, FetchError> {
    let status = resp.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::RateLimited);
    }
    if !status.is_success() {
        return Err(FetchError::Http {
            status: status.as_u16(),
        });
    }
    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
}
