//! Trend scraper: binary entrypoint.
//! Validates config, runs the pipeline once, then on a cron schedule until Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trend_scraper::api::{self, AppState};
use trend_scraper::config::AppConfig;
use trend_scraper::ingest::scheduler::start_scheduler;
use trend_scraper::metrics::Metrics;
use trend_scraper::pipeline::TrendPipeline;

/// `RUST_LOG` controls filtering; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trend_scraper=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = match AppConfig::from_env().and_then(|c| c.validate().map(|_| c)) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "initialization error");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cfg).await {
        tracing::error!(error = ?e, "fatal error");
        std::process::exit(1);
    }
}

async fn run(cfg: AppConfig) -> Result<()> {
    let metrics = Metrics::init()?;
    let pipeline = Arc::new(TrendPipeline::from_config(&cfg)?);
    tracing::info!(
        sources = cfg.sources.len(),
        sink = ?cfg.sink,
        schedule = %cfg.cron_schedule,
        "configuration loaded"
    );

    let mut scheduler = start_scheduler(&cfg.scheduler_cron(), pipeline.clone()).await?;

    // The API is up before the first run starts, so /health answers while it runs.
    let server = match cfg.api_addr.as_deref() {
        Some(addr) => {
            let app = api::router(AppState {
                pipeline: pipeline.clone(),
            })
            .merge(metrics.router());
            let (_, handle) = api::spawn_server(addr, app, shutdown_signal()).await?;
            Some(handle)
        }
        None => None,
    };

    tracing::info!("running initial trend scraping process");
    pipeline.run_logged().await;

    match server {
        Some(handle) => handle
            .await
            .context("api task panicked")?
            .context("api server")?,
        None => shutdown_signal().await,
    }

    tracing::info!("shutting down");
    scheduler.shutdown().await.context("stopping scheduler")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler failed");
    }
}
