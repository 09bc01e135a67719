// src/sink/mod.rs
pub mod supabase;

use std::str::FromStr;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::analyze::Trend;
use crate::ingest::types::Story;

/// What a run persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    /// Ranked trends from the extractor.
    #[default]
    Trends,
    /// Raw stories, one row each, with a flat score of 1.
    Stories,
}

impl FromStr for PersistMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trends" => Ok(PersistMode::Trends),
            "stories" => Ok(PersistMode::Stories),
            other => Err(anyhow!("unsupported PERSIST_MODE: {other}")),
        }
    }
}

/// One batch handed to a sink per run.
#[derive(Debug, Clone)]
pub enum Batch {
    Trends(Vec<Trend>),
    Stories(Vec<Story>),
}

impl Batch {
    pub fn len(&self) -> usize {
        match self {
            Batch::Trends(v) => v.len(),
            Batch::Stories(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows for the `trending_topics` table, all stamped with the same `date`.
    pub fn into_rows(self, stamped_at: DateTime<Utc>) -> Vec<TrendRow> {
        let date = stamped_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        match self {
            Batch::Trends(v) => v.into_iter().map(|t| TrendRow::from_trend(t, &date)).collect(),
            Batch::Stories(v) => v.iter().map(|s| TrendRow::from_story(s, &date)).collect(),
        }
    }
}

/// Row shape stored by every sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendRow {
    pub date: String,
    pub topic_title: String,
    pub topic_desc: String,
    pub trend_score: u32,
}

impl TrendRow {
    pub fn from_trend(t: Trend, date: &str) -> Self {
        Self {
            date: date.to_string(),
            topic_title: t.topic_title,
            topic_desc: t.topic_desc,
            trend_score: t.trend_score,
        }
    }

    pub fn from_story(s: &Story, date: &str) -> Self {
        Self {
            date: date.to_string(),
            topic_title: s.headline.clone(),
            topic_desc: format!("Source: {}", s.link),
            trend_score: 1,
        }
    }
}

#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    /// Write the whole batch in one operation. Returns the number of rows written.
    async fn write(&self, batch: Batch) -> Result<usize>;
    fn name(&self) -> &'static str;
}

/// Logs rows instead of storing them (dry runs).
pub struct LogSink;

#[async_trait::async_trait]
impl Sink for LogSink {
    async fn write(&self, batch: Batch) -> Result<usize> {
        let rows = batch.into_rows(Utc::now());
        for r in &rows {
            tracing::info!(
                topic = %r.topic_title,
                score = r.trend_score,
                desc = %r.topic_desc,
                "dry-run row"
            );
        }
        Ok(rows.len())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Keeps written batches in memory.
#[derive(Default)]
pub struct MemorySink {
    pub batches: Mutex<Vec<Vec<TrendRow>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<TrendRow> {
        self.batches
            .lock()
            .map(|b| b.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Sink for MemorySink {
    async fn write(&self, batch: Batch) -> Result<usize> {
        let rows = batch.into_rows(Utc::now());
        let n = rows.len();
        self.batches
            .lock()
            .map_err(|_| anyhow!("memory sink poisoned"))?
            .push(rows);
        Ok(n)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stories_become_flat_score_rows() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let rows = Batch::Stories(vec![Story {
            headline: "Claude 4 ships".into(),
            link: "https://www.anthropic.com/news/claude-4".into(),
            date_posted: "2025-03-01".into(),
        }])
        .into_rows(at);
        assert_eq!(
            rows,
            vec![TrendRow {
                date: "2025-03-01T12:00:00.000Z".into(),
                topic_title: "Claude 4 ships".into(),
                topic_desc: "Source: https://www.anthropic.com/news/claude-4".into(),
                trend_score: 1,
            }]
        );
    }

    #[test]
    fn trend_rows_share_one_stamp() {
        let at = Utc::now();
        let t = |s: &str| Trend {
            topic_title: s.into(),
            topic_desc: "d".into(),
            trend_score: 20,
        };
        let rows = Batch::Trends(vec![t("openai"), t("model")]).into_rows(at);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, rows[1].date);
        assert_eq!(rows[1].topic_title, "model");
    }

    #[test]
    fn persist_mode_parses() {
        assert_eq!("Trends".parse::<PersistMode>().unwrap(), PersistMode::Trends);
        assert_eq!(" stories ".parse::<PersistMode>().unwrap(), PersistMode::Stories);
        assert!("both".parse::<PersistMode>().is_err());
    }

    #[tokio::test]
    async fn memory_sink_keeps_batches() {
        let sink = MemorySink::new();
        let n = sink
            .write(Batch::Trends(vec![Trend {
                topic_title: "agents".into(),
                topic_desc: "d".into(),
                trend_score: 30,
            }]))
            .await
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(sink.rows()[0].trend_score, 30);
    }
}
