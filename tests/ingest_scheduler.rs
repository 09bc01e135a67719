// tests/ingest_scheduler.rs
use std::sync::Arc;

use async_trait::async_trait;
use trend_scraper::config::{to_seconds_cron, DEFAULT_CRON};
use trend_scraper::ingest::providers::ProviderSet;
use trend_scraper::ingest::scheduler::start_scheduler;
use trend_scraper::sink::MemorySink;
use trend_scraper::{FetchError, Fetcher, Source, SourceProvider, Story, TrendPipeline};

struct RepeatProvider;

#[async_trait]
impl SourceProvider for RepeatProvider {
    async fn fetch_stories(&self, source: &Source) -> Result<Vec<Story>, FetchError> {
        Ok((0..2)
            .map(|n| Story {
                headline: "Agents everywhere".into(),
                link: format!("{}/{n}", source.identifier),
                date_posted: "2025-03-01".into(),
            })
            .collect())
    }
    fn name(&self) -> &'static str {
        "repeat"
    }
}

fn pipeline(sink: Arc<MemorySink>) -> Arc<TrendPipeline> {
    let providers = ProviderSet::new(Arc::new(RepeatProvider), Arc::new(RepeatProvider));
    Arc::new(TrendPipeline::new(
        vec![
            Source::new("https://a.test/news"),
            Source::new("https://x.com/OpenAI"),
        ],
        Fetcher::new(providers).with_concurrency(2),
        sink,
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scheduler_starts_and_shuts_down() {
    let sink = Arc::new(MemorySink::new());
    let cron = to_seconds_cron(DEFAULT_CRON);
    let mut scheduler = start_scheduler(&cron, pipeline(sink.clone()))
        .await
        .expect("scheduler starts");

    // every 3 hours: nothing fires during the test
    assert!(sink.rows().is_empty());
    scheduler.shutdown().await.expect("scheduler stops");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_cron_is_rejected() {
    let sink = Arc::new(MemorySink::new());
    let err = start_scheduler("every now and then", pipeline(sink))
        .await
        .err()
        .expect("bad cron must fail");
    assert!(format!("{err:#}").contains("invalid cron schedule"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_can_be_spawned_on_the_runtime() {
    let sink = Arc::new(MemorySink::new());
    let p = pipeline(sink.clone());

    let report = tokio::spawn(async move { p.run_once().await })
        .await
        .expect("join")
        .expect("run ok");
    assert_eq!(report.stories, 4);
    assert_eq!(sink.rows().len(), report.written);
    assert!(report.written > 0);
}
