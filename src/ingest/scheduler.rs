// src/ingest/scheduler.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::pipeline::TrendPipeline;

/// Start a cron job that runs the pipeline on `cron` (seconds-first, 6 fields).
/// Failures inside a run are logged by the pipeline; the job keeps firing.
pub async fn start_scheduler(cron: &str, pipeline: Arc<TrendPipeline>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .context("creating job scheduler")?;

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pipeline = pipeline.clone();
        Box::pin(async move {
            tracing::info!(at = %chrono::Utc::now().to_rfc3339(), "cron job triggered");
            pipeline.run_logged().await;
        })
    })
    .with_context(|| format!("invalid cron schedule: {cron}"))?;

    scheduler.add(job).await.context("adding scrape job")?;
    scheduler.start().await.context("starting job scheduler")?;

    tracing::info!(schedule = cron, "cron job scheduled");
    Ok(scheduler)
}
