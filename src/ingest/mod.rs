// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod scheduler;
pub mod types;

use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;

use crate::ingest::providers::ProviderSet;
use crate::ingest::types::{FetchError, Source, Story};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scrape_stories_total", "Stories collected from all sources.");
        describe_counter!("scrape_posts_total", "Posts returned by the X search adapter.");
        describe_counter!(
            "scrape_source_errors_total",
            "Per-source fetch failures, by error kind."
        );
        describe_counter!(
            "scrape_rate_limited_total",
            "Sources skipped because the provider rate limited us."
        );
        describe_histogram!("scrape_fetch_ms", "Per-source fetch time in milliseconds.");
    });
}

/// Fetches stories for a list of sources.
///
/// Never fails: each source's error is logged and that source contributes nothing.
/// Up to `concurrency` sources are in flight at once; results always come back in
/// source-list order.
pub struct Fetcher {
    providers: ProviderSet,
    concurrency: usize,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(providers: ProviderSet) -> Self {
        Self {
            providers,
            concurrency: 1,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-source results, index-aligned with `sources`.
    pub async fn fetch_per_source(&self, sources: &[Source]) -> Vec<Vec<Story>> {
        ensure_metrics_described();
        // Collect first: a borrowing closure inside the stream type makes the run future non-Send.
        let pending: Vec<_> = sources.iter().map(|s| self.fetch_one(s)).collect();
        stream::iter(pending)
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// All stories from all sources, concatenated in source order.
    pub async fn fetch(&self, sources: &[Source]) -> Vec<Story> {
        aggregate(self.fetch_per_source(sources).await)
    }

    async fn fetch_one(&self, source: &Source) -> Vec<Story> {
        let provider = self.providers.for_source(source);
        let t0 = Instant::now();

        let result = match tokio::time::timeout(self.timeout, provider.fetch_stories(source)).await
        {
            Ok(r) => r,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        };
        histogram!("scrape_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        match result {
            Ok(stories) => {
                tracing::info!(
                    source = %source,
                    provider = provider.name(),
                    count = stories.len(),
                    "fetched stories"
                );
                counter!("scrape_stories_total").increment(stories.len() as u64);
                stories
            }
            Err(FetchError::RateLimited) => {
                tracing::warn!(
                    source = %source,
                    provider = provider.name(),
                    reason = "rate_limited",
                    "rate limit exceeded, skipping source"
                );
                counter!("scrape_rate_limited_total").increment(1);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(
                    source = %source,
                    provider = provider.name(),
                    error = %e,
                    "source fetch failed, skipping"
                );
                counter!("scrape_source_errors_total", "kind" => e.kind_label()).increment(1);
                Vec::new()
            }
        }
    }
}

/// Concatenate per-source results in order. No dedup, no sorting.
pub fn aggregate(per_source: Vec<Vec<Story>>) -> Vec<Story> {
    per_source.into_iter().flatten().collect()
}
