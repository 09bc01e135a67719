use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use tokio::task::JoinHandle;

use crate::pipeline::TrendPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TrendPipeline>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/last-run", get(last_run))
        .route("/api/sources", get(sources))
        .with_state(state)
}

/// Bind `addr` and serve `app` on a background task until `shutdown` resolves.
/// Returns the bound address (useful with port 0) and the server task.
pub async fn spawn_server<F>(
    addr: &str,
    app: Router,
    shutdown: F,
) -> Result<(SocketAddr, JoinHandle<std::io::Result<()>>)>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    let local = listener.local_addr().context("reading bound address")?;
    tracing::info!(addr = %local, "api listening");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    });
    Ok((local, handle))
}

async fn last_run(State(state): State<AppState>) -> impl IntoResponse {
    match state.pipeline.last_run() {
        Some(report) => Json(report).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn sources(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(
        state
            .pipeline
            .sources()
            .iter()
            .map(|s| s.identifier.clone())
            .collect(),
    )
}
