// src/analyze/tokenize.rs
//! Rule-based headline tokenizer.
//!
//! A headline yields two kinds of candidates:
//! - single words longer than 3 chars that are not stop words;
//! - 2-word phrases longer than 6 chars and 3-word phrases longer than 10 chars,
//!   built from the full token sequence (stop words included).
//!
//! Lengths are counted in chars, including the separating spaces of a phrase.

use once_cell::sync::Lazy;
use std::collections::HashSet;

const MIN_WORD_CHARS: usize = 4;
const MIN_BIGRAM_CHARS: usize = 7;
const MIN_TRIGRAM_CHARS: usize = 11;

/// Function words plus a few generic adjectives that never make a useful trend.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "for", "with", "in", "on", "at", "to", "from", "by",
    "about", "as", "into", "like", "through", "after", "over", "between", "out", "of", "is",
    "are", "was", "were", "be", "been", "new", "top", "best", "latest", "today", "now",
];

static STOP_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOP_WORDS.iter().copied().collect());

pub fn is_stop_word(w: &str) -> bool {
    STOP_SET.contains(w)
}

/// Lower-case, strip punctuation, split on whitespace.
pub fn tokenize(headline: &str) -> Vec<String> {
    let cleaned: String = headline
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Candidates for one headline, in discovery order: all single words first,
/// then phrases by start position (2-word before 3-word at each position).
pub fn candidates(headline: &str) -> Vec<String> {
    let tokens = tokenize(headline);
    let mut out = Vec::new();

    out.extend(
        tokens
            .iter()
            .filter(|t| t.chars().count() >= MIN_WORD_CHARS && !is_stop_word(t))
            .cloned(),
    );

    for i in 0..tokens.len().saturating_sub(1) {
        let bigram = format!("{} {}", tokens[i], tokens[i + 1]);
        if bigram.chars().count() >= MIN_BIGRAM_CHARS {
            out.push(bigram);
        }
        if i + 2 < tokens.len() {
            let trigram = format!("{} {} {}", tokens[i], tokens[i + 1], tokens[i + 2]);
            if trigram.chars().count() >= MIN_TRIGRAM_CHARS {
                out.push(trigram);
            }
        }
    }

    out
}
