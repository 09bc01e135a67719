// src/analyze/mod.rs
//! Trend analysis: headline tokenizer and frequency ranking.

pub mod tokenize;
pub mod trends;

pub use crate::analyze::trends::{extract, Trend, MAX_TRENDS};
