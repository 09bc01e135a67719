// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::Source;

const ENV_PATH: &str = "SOURCES_PATH";
const ENV_LIST: &str = "SOURCES";

/// Sources used when nothing is configured.
pub const DEFAULT_SOURCES: &[&str] = &[
    "https://x.com/OpenAIDevs",
    "https://x.com/OpenAI",
    "https://x.com/AnthropicAI",
    "https://x.com/AIatMeta",
    "https://x.com/skirano",
    "https://x.com/xai",
    "https://x.com/alexalbert__",
    "https://x.com/rauchg",
    "https://x.com/amasad",
    "https://x.com/leeerob",
    "https://x.com/nutlope",
    "https://x.com/akshay_pachaar",
    "https://x.com/firecrawl_dev",
    "https://x.com/googleaidevs",
    "https://x.com/karpathy",
    "https://x.com/ylecun",
    "https://x.com/DrJimFan",
    "https://x.com/ExaAILabs",
    "https://x.com/LangChainAI",
    "https://x.com/Sumanth_077",
    "https://x.com/Saboo_Shubham_",
    "https://www.firecrawl.dev/blog",
    "https://openai.com/news/",
    "https://www.anthropic.com/news",
    "https://news.ycombinator.com/",
    "https://www.reuters.com/technology/artificial-intelligence/",
    "https://simonwillison.net/",
    "https://buttondown.com/ainews/archive/",
];

/// Load sources from an explicit path. Supports TOML (`sources = [...]`) or a JSON array.
pub fn load_sources_from(path: &Path) -> Result<Vec<Source>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

/// Load sources using env vars + fallbacks:
/// 1) $SOURCES_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
/// 4) $SOURCES (comma-separated)
/// 5) built-in defaults
pub fn load_sources_default() -> Result<Vec<Source>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        } else {
            return Err(anyhow!("SOURCES_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    if let Ok(list) = std::env::var(ENV_LIST) {
        let parsed = parse_sources_list(&list);
        if !parsed.is_empty() {
            return Ok(parsed);
        }
    }
    Ok(default_sources())
}

pub fn default_sources() -> Vec<Source> {
    DEFAULT_SOURCES.iter().copied().map(Source::from).collect()
}

/// Comma-separated list, as in `SOURCES=https://a,https://b`.
pub fn parse_sources_list(s: &str) -> Vec<Source> {
    clean_list(s.split(',').map(str::to_string))
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<Source>> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("sources");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported sources file format"))
}

fn parse_toml(s: &str) -> Result<Vec<Source>> {
    #[derive(serde::Deserialize)]
    struct TomlSources {
        sources: Vec<String>,
    }
    let v: TomlSources = toml::from_str(s)?;
    Ok(clean_list(v.sources))
}

fn parse_json(s: &str) -> Result<Vec<Source>> {
    let v: Vec<String> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trim, drop empties and duplicates. Order is kept: it decides trend tie-breaks.
fn clean_list(items: impl IntoIterator<Item = String>) -> Vec<Source> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() && seen.insert(t.to_string()) {
            out.push(Source::new(t));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[Source]) -> Vec<&str> {
        v.iter().map(|s| s.identifier.as_str()).collect()
    }

    #[test]
    fn dedup_trim_and_formats_work() {
        let toml = r#"sources = [" https://b.test ", "", "https://a.test", "https://a.test"]"#;
        let json = r#"["https://x.com/xai", "  https://a.test  ", ""]"#;
        let toml_out = parse_toml(toml).unwrap();
        assert_eq!(ids(&toml_out), vec!["https://b.test", "https://a.test"]);
        let json_out = parse_json(json).unwrap();
        assert_eq!(ids(&json_out), vec!["https://x.com/xai", "https://a.test"]);
    }

    #[test]
    fn comma_list_keeps_order() {
        let v = parse_sources_list("https://z.test, ,https://a.test,https://z.test");
        assert_eq!(ids(&v), vec!["https://z.test", "https://a.test"]);
    }

    #[test]
    fn defaults_are_the_28_builtin_sources() {
        let d = default_sources();
        assert_eq!(d.len(), 28);
        assert_eq!(d[0].identifier, "https://x.com/OpenAIDevs");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_sources("not a list", "txt").is_err());
    }
}
