// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_PROFILE_PATH: &str = "INGEST_PROFILE_PATH";
pub const DEFAULT_ENDPOINT: &str = "https://api.goperigon.com/v1/all";
pub const DEFAULT_QUERY: &str = "Las Vegas nightlife OR Encore Beach Club OR Zouk Nightclub OR LIV Nightclub OR Marquee Nightclub OR Omnia Nightclub";
pub const MAX_PAGE_SIZE: u32 = 100;

fn default_query() -> String {
    DEFAULT_QUERY.to_string()
}
fn default_page_size() -> u32 {
    25
}
fn default_fallback_source() -> String {
    "perigon".to_string()
}
fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

/// What to ask the provider for on every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryProfile {
    #[serde(default = "default_query")]
    pub query: String,
    /// Provider-side source filter; empty means all sources.
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Window start is today (UTC) minus this many days.
    #[serde(default)]
    pub lookback_days: u32,
    /// Source label for items whose provider record has none.
    #[serde(default = "default_fallback_source")]
    pub fallback_source: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for QueryProfile {
    fn default() -> Self {
        Self {
            query: default_query(),
            sources: Vec::new(),
            page_size: default_page_size(),
            lookback_days: 0,
            fallback_source: default_fallback_source(),
            endpoint: default_endpoint(),
        }
    }
}

impl QueryProfile {
    fn sanitized(mut self) -> Self {
        self.query = self.query.trim().to_string();
        self.sources = clean_list(self.sources);
        self.page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
        if self.fallback_source.trim().is_empty() {
            self.fallback_source = default_fallback_source();
        }
        self
    }
}

/// Load a profile from an explicit path. Supports TOML or JSON formats.
pub fn load_profile_from(path: &Path) -> Result<QueryProfile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading ingest profile from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_profile(&content, ext.as_str())
        .with_context(|| format!("parsing ingest profile {}", path.display()))
}

/// Load the profile using env var + fallbacks:
/// 1) $INGEST_PROFILE_PATH
/// 2) config/ingest.toml
/// 3) config/ingest.json
/// 4) built-in defaults
pub fn load_profile_default() -> Result<QueryProfile> {
    if let Ok(p) = std::env::var(ENV_PROFILE_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_profile_from(&pb);
        } else {
            return Err(anyhow!("{ENV_PROFILE_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/ingest.toml");
    if toml_p.exists() {
        return load_profile_from(&toml_p);
    }
    let json_p = PathBuf::from("config/ingest.json");
    if json_p.exists() {
        return load_profile_from(&json_p);
    }
    Ok(QueryProfile::default())
}

fn parse_profile(s: &str, hint_ext: &str) -> Result<QueryProfile> {
    let parsed = match hint_ext {
        "json" => serde_json::from_str::<QueryProfile>(s).map_err(anyhow::Error::from),
        "toml" => toml::from_str::<QueryProfile>(s).map_err(anyhow::Error::from),
        _ => toml::from_str::<QueryProfile>(s)
            .map_err(anyhow::Error::from)
            .or_else(|_| serde_json::from_str::<QueryProfile>(s).map_err(anyhow::Error::from)),
    };
    parsed.map(QueryProfile::sanitized)
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    use std::collections::BTreeSet;
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() {
            set.insert(t.to_string());
        }
    }
    set.into_iter().collect()
}
