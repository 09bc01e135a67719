// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod sink;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{extract, Trend};
pub use crate::api::router;
pub use crate::config::AppConfig;
pub use crate::ingest::types::{FetchError, Source, SourceKind, SourceProvider, Story};
pub use crate::ingest::{aggregate, Fetcher};
pub use crate::pipeline::{RunReport, TrendPipeline};
pub use crate::sink::{Batch, PersistMode, Sink, TrendRow};
