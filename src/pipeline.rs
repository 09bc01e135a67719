// src/pipeline.rs
//! One run: fetch -> aggregate -> extract -> sink.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;

use crate::analyze;
use crate::config::{AppConfig, SinkKind};
use crate::ingest::providers::firecrawl::FirecrawlProvider;
use crate::ingest::providers::x_search::XSearchProvider;
use crate::ingest::providers::ProviderSet;
use crate::ingest::types::Source;
use crate::ingest::Fetcher;
use crate::sink::supabase::SupabaseSink;
use crate::sink::{Batch, LogSink, PersistMode, Sink};

const USER_AGENT: &str = concat!("trend-scraper/", env!("CARGO_PKG_VERSION"));

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub mode: PersistMode,
    pub sources: usize,
    pub stories: usize,
    pub trends: usize,
    pub written: usize,
}

pub struct TrendPipeline {
    sources: Vec<Source>,
    fetcher: Fetcher,
    sink: Arc<dyn Sink>,
    mode: PersistMode,
    last_run: RwLock<Option<RunReport>>,
}

impl TrendPipeline {
    pub fn new(sources: Vec<Source>, fetcher: Fetcher, sink: Arc<dyn Sink>) -> Self {
        Self {
            sources,
            fetcher,
            sink,
            mode: PersistMode::Trends,
            last_run: RwLock::new(None),
        }
    }

    pub fn with_mode(mut self, mode: PersistMode) -> Self {
        self.mode = mode;
        self
    }

    /// Wire real providers and the configured sink.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("building http client")?;

        let social = XSearchProvider::new(http.clone(), cfg.x_api_bearer.clone());
        let web = FirecrawlProvider::new(http.clone(), cfg.firecrawl_api_key.clone())
            .with_topic(cfg.topic.clone());
        let fetcher = Fetcher::new(ProviderSet::new(Arc::new(social), Arc::new(web)))
            .with_concurrency(cfg.fetch_concurrency)
            .with_timeout(Duration::from_secs(cfg.fetch_timeout_secs));

        let sink: Arc<dyn Sink> = match cfg.sink {
            SinkKind::Supabase => Arc::new(
                SupabaseSink::new(http, cfg.supabase_url.clone(), cfg.supabase_key.clone())
                    .with_table(cfg.trends_table.clone()),
            ),
            SinkKind::Log => Arc::new(LogSink),
        };

        Ok(Self::new(cfg.sources.clone(), fetcher, sink).with_mode(cfg.persist_mode))
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn last_run(&self) -> Option<RunReport> {
        self.last_run.read().ok().and_then(|g| g.clone())
    }

    /// Run the whole pipeline once. A sink failure ends the run with an error.
    pub async fn run_once(&self) -> Result<RunReport> {
        let started_at = Utc::now();
        counter!("scrape_runs_total").increment(1);
        tracing::info!(
            sources = self.sources.len(),
            mode = ?self.mode,
            "starting trend scraping run"
        );

        let stories = self.fetcher.fetch(&self.sources).await;
        tracing::info!(count = stories.len(), "found stories from all sources");

        let (batch, trends) = match self.mode {
            PersistMode::Trends => {
                let trends = analyze::extract(&stories);
                tracing::info!(count = trends.len(), "identified trends");
                counter!("trends_emitted_total").increment(trends.len() as u64);
                let n = trends.len();
                (Batch::Trends(trends), n)
            }
            PersistMode::Stories => (Batch::Stories(stories.clone()), 0),
        };

        let written = if batch.is_empty() {
            tracing::info!("nothing to insert");
            0
        } else {
            match self.sink.write(batch).await {
                Ok(n) => {
                    tracing::info!(rows = n, sink = self.sink.name(), "batch written");
                    n
                }
                Err(e) => {
                    counter!("sink_write_errors_total").increment(1);
                    return Err(e.context(format!("writing to {} sink", self.sink.name())));
                }
            }
        };

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            mode: self.mode,
            sources: self.sources.len(),
            stories: stories.len(),
            trends,
            written,
        };
        gauge!("scrape_last_run_ts").set(report.finished_at.timestamp() as f64);
        if let Ok(mut g) = self.last_run.write() {
            *g = Some(report.clone());
        }
        tracing::info!("trend scraping run completed");
        Ok(report)
    }

    /// Run once and log any failure instead of returning it (scheduler ticks, startup run).
    pub async fn run_logged(&self) {
        if let Err(e) = self.run_once().await {
            tracing::error!(error = ?e, "trend scraping run failed");
        }
    }
}
