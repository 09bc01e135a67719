// src/sink/supabase.rs
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::Deserialize;

use super::{Batch, Sink};

pub const DEFAULT_TABLE: &str = "trending_topics";

/// Batch insert into a Supabase table through its PostgREST endpoint.
#[derive(Clone)]
pub struct SupabaseSink {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
}

#[derive(Deserialize)]
struct PostgrestError {
    message: Option<String>,
}

impl SupabaseSink {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            table: DEFAULT_TABLE.to_string(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    fn insert_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

#[async_trait::async_trait]
impl Sink for SupabaseSink {
    async fn write(&self, batch: Batch) -> Result<usize> {
        let what = match batch {
            Batch::Trends(_) => "trends",
            Batch::Stories(_) => "stories as trends",
        };
        let rows = batch.into_rows(Utc::now());
        tracing::info!(count = rows.len(), table = %self.table, "inserting {what}");

        let resp = self
            .http
            .post(self.insert_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await
            .with_context(|| format!("supabase insert into {}", self.table))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<PostgrestError>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(body);
            return Err(anyhow!("Failed to insert {what}: {message} (HTTP {status})"));
        }
        Ok(rows.len())
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}
