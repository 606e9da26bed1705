// src/config.rs
//! Process settings read from the environment (optionally seeded from `.env`).

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

pub const ENV_API_KEY: &str = "PERIGON_API_KEY";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_BROKER_URL: &str = "BROKER_URL";
pub const ENV_INTERVAL_SECS: &str = "INGEST_INTERVAL_SECS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/intel.db";
pub const DEFAULT_INTERVAL_SECS: u64 = 900;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

#[derive(Clone)]
pub struct Settings {
    /// `None` disables fetching; cycles then end as a skip.
    pub api_key: Option<String>,
    pub database_url: String,
    /// Consumed by an external scheduler deployment, never by this process.
    pub broker_url: Option<String>,
    /// 0 turns the in-process scheduler off.
    pub interval_secs: u64,
    pub fetch_timeout: Duration,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("database_url", &self.database_url)
            .field("broker_url", &self.broker_url.is_some())
            .field("interval_secs", &self.interval_secs)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            broker_url: None,
            interval_secs: DEFAULT_INTERVAL_SECS,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_secs(name: &str, default: u64) -> Result<u64> {
    match non_empty_var(name) {
        Some(v) => v
            .parse()
            .with_context(|| format!("{name} must be a whole number of seconds, got {v:?}")),
        None => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let timeout_secs = parse_secs(ENV_FETCH_TIMEOUT_SECS, DEFAULT_FETCH_TIMEOUT_SECS)?;
        Ok(Self {
            api_key: non_empty_var(ENV_API_KEY),
            database_url: non_empty_var(ENV_DATABASE_URL)
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            broker_url: non_empty_var(ENV_BROKER_URL),
            interval_secs: parse_secs(ENV_INTERVAL_SECS, DEFAULT_INTERVAL_SECS)?,
            fetch_timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }
}
