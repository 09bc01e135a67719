// src/config/mod.rs
//! Process configuration, read from the environment (and `.env` via dotenvy in main).

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};

use crate::ingest::config::load_sources_default;
use crate::ingest::providers::firecrawl::DEFAULT_TOPIC;
use crate::ingest::types::Source;
use crate::sink::supabase::DEFAULT_TABLE;
use crate::sink::PersistMode;

pub const DEFAULT_CRON: &str = "0 */3 * * *";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 120;

/// Which sink the pipeline writes to. `MemorySink` is for embedding and tests only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Supabase,
    Log,
}

impl FromStr for SinkKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(SinkKind::Supabase),
            "log" => Ok(SinkKind::Log),
            other => Err(anyhow!("unsupported SINK: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub firecrawl_api_key: String,
    pub x_api_bearer: String,
    pub supabase_url: String,
    pub supabase_key: String,
    /// 5-field cron expression (minute first).
    pub cron_schedule: String,
    pub sink: SinkKind,
    pub persist_mode: PersistMode,
    pub sources: Vec<Source>,
    pub fetch_concurrency: usize,
    pub fetch_timeout_secs: u64,
    pub trends_table: String,
    pub topic: String,
    pub api_addr: Option<String>,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|_| anyhow!("{name} has an invalid value: {v}")),
        _ => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            firecrawl_api_key: var_or("FIRECRAWL_API_KEY", ""),
            x_api_bearer: var_or("X_API_BEARER_TOKEN", ""),
            supabase_url: var_or("SUPABASE_URL", ""),
            supabase_key: var_or("SUPABASE_KEY", ""),
            cron_schedule: var_or("CRON_SCHEDULE", DEFAULT_CRON),
            sink: var_or("SINK", "supabase").parse()?,
            persist_mode: var_or("PERSIST_MODE", "trends").parse()?,
            sources: load_sources_default()?,
            fetch_concurrency: parse_var("FETCH_CONCURRENCY", 1usize)?.max(1),
            fetch_timeout_secs: parse_var("FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?,
            trends_table: var_or("TRENDS_TABLE", DEFAULT_TABLE),
            topic: var_or("TOPIC", DEFAULT_TOPIC),
            api_addr: env::var("API_ADDR").ok().filter(|v| !v.trim().is_empty()),
        })
    }

    /// Fail if any required variable is missing. All missing names are reported at once.
    pub fn validate(&self) -> Result<()> {
        let mut required = vec![
            ("FIRECRAWL_API_KEY", &self.firecrawl_api_key),
            ("X_API_BEARER_TOKEN", &self.x_api_bearer),
        ];
        if self.sink == SinkKind::Supabase {
            required.push(("SUPABASE_URL", &self.supabase_url));
            required.push(("SUPABASE_KEY", &self.supabase_key));
        }

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, v)| v.is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            bail!(
                "Missing required environment variables: {}",
                missing.join(", ")
            );
        }

        if self.sources.is_empty() {
            tracing::warn!("no sources configured; runs will find nothing to analyze");
        }
        Ok(())
    }

    /// Cron expression in the seconds-first form the scheduler expects.
    pub fn scheduler_cron(&self) -> String {
        to_seconds_cron(&self.cron_schedule)
    }
}

/// `"0 */3 * * *"` -> `"0 0 */3 * * *"`; 6/7-field expressions pass through.
pub fn to_seconds_cron(expr: &str) -> String {
    let expr = expr.trim();
    if expr.split_whitespace().count() == 5 {
        format!("0 {expr}")
    } else {
        expr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> AppConfig {
        AppConfig {
            firecrawl_api_key: "fc".into(),
            x_api_bearer: "x".into(),
            supabase_url: "https://db.test".into(),
            supabase_key: "key".into(),
            cron_schedule: DEFAULT_CRON.into(),
            sink: SinkKind::Supabase,
            persist_mode: PersistMode::Trends,
            sources: vec![Source::new("https://openai.com/news/")],
            fetch_concurrency: 1,
            fetch_timeout_secs: 120,
            trends_table: DEFAULT_TABLE.into(),
            topic: DEFAULT_TOPIC.into(),
            api_addr: None,
        }
    }

    #[test]
    fn complete_config_validates() {
        cfg().validate().unwrap();
    }

    #[test]
    fn all_missing_names_are_reported() {
        let mut c = cfg();
        c.x_api_bearer.clear();
        c.supabase_key.clear();
        let err = c.validate().unwrap_err().to_string();
        assert_eq!(
            err,
            "Missing required environment variables: X_API_BEARER_TOKEN, SUPABASE_KEY"
        );
    }

    #[test]
    fn log_sink_does_not_need_store_credentials() {
        let mut c = cfg();
        c.sink = SinkKind::Log;
        c.supabase_url.clear();
        c.supabase_key.clear();
        c.validate().unwrap();
    }

    #[test]
    fn five_field_cron_gets_seconds() {
        assert_eq!(to_seconds_cron("0 */3 * * *"), "0 0 */3 * * *");
        assert_eq!(to_seconds_cron("30 0 * * * *"), "30 0 * * * *");
    }

    #[test]
    fn sink_kind_parses() {
        assert_eq!("LOG".parse::<SinkKind>().unwrap(), SinkKind::Log);
        assert!("s3".parse::<SinkKind>().is_err());
        // nothing in the process could read a memory sink
        assert!("memory".parse::<SinkKind>().is_err());
    }

    #[test]
    fn empty_source_list_is_valid() {
        let mut c = cfg();
        c.sources.clear();
        c.validate().unwrap();
    }
}
