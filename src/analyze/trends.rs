// src/analyze/trends.rs
//! Frequency-based trend extraction over one run's stories.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analyze::tokenize::candidates;
use crate::ingest::types::Story;

pub const MAX_TRENDS: usize = 10;
pub const SCORE_PER_MENTION: u32 = 10;
const MIN_OCCURRENCES: usize = 2;
const EXCERPT_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trend {
    pub topic_title: String,
    pub topic_desc: String,
    pub trend_score: u32,
}

/// Candidate -> count, remembering the order candidates were first seen.
#[derive(Debug, Default)]
pub struct CandidateCounts {
    index: HashMap<String, usize>,
    entries: Vec<(String, usize)>,
}

impl CandidateCounts {
    pub fn add(&mut self, candidate: String) {
        match self.index.get(&candidate) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(candidate.clone(), self.entries.len());
                self.entries.push((candidate, 1));
            }
        }
    }

    pub fn count(&self, candidate: &str) -> usize {
        self.index
            .get(candidate)
            .map(|&i| self.entries[i].1)
            .unwrap_or(0)
    }

    /// Candidates seen at least `min` times, most frequent first; ties keep first-seen order.
    pub fn ranked(self, min: usize) -> Vec<(String, usize)> {
        let mut kept: Vec<_> = self.entries.into_iter().filter(|(_, n)| *n >= min).collect();
        kept.sort_by(|a, b| b.1.cmp(&a.1));
        kept
    }
}

pub fn count_candidates(stories: &[Story]) -> CandidateCounts {
    let mut counts = CandidateCounts::default();
    for s in stories {
        for c in candidates(&s.headline) {
            counts.add(c);
        }
    }
    counts
}

/// Rank recurring candidates and turn the top ones into trends.
pub fn extract(stories: &[Story]) -> Vec<Trend> {
    if stories.is_empty() {
        tracing::debug!("no stories to analyze");
        return Vec::new();
    }

    let lowered: Vec<String> = stories.iter().map(|s| s.headline.to_lowercase()).collect();

    count_candidates(stories)
        .ranked(MIN_OCCURRENCES)
        .into_iter()
        .take(MAX_TRENDS)
        .map(|(candidate, count)| {
            let related: Vec<usize> = lowered
                .iter()
                .enumerate()
                .filter(|(_, h)| h.contains(candidate.as_str()))
                .map(|(i, _)| i)
                .collect();
            let topic_desc = describe(&related, stories, count);
            Trend {
                topic_title: candidate,
                topic_desc,
                trend_score: count as u32 * SCORE_PER_MENTION,
            }
        })
        .collect()
}

fn describe(related: &[usize], stories: &[Story], count: usize) -> String {
    match related.first() {
        Some(&first) => {
            let excerpt: String = stories[first].headline.chars().take(EXCERPT_CHARS).collect();
            format!(
                "Based on {} mentions across different sources. First mentioned in: \"{}...\"",
                related.len(),
                excerpt
            )
        }
        None => format!("Mentioned {count} times in recent stories"),
    }
}
