// src/ingest/providers/perigon.rs
use std::time::Duration;

use async_trait::async_trait;
use metrics::histogram;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ConfigError, FetchError};
use crate::ingest::types::{FetchRequest, NewsProvider, RawItem};

/// Longest provider error body kept in a `FetchError`.
const MAX_ERROR_BODY: usize = 512;

// Articles stay untyped here; each one is decoded on its own.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<Value>,
}

/// Fetch client for the Perigon `/v1/all` search endpoint.
#[derive(Clone)]
pub struct PerigonProvider {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
    timeout: Duration,
}

impl PerigonProvider {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Decode a search response body, capped at `page_size` records.
    ///
    /// Only an unreadable envelope is a `Decode` error. Bad individual
    /// articles come back as records the normalizer will reject.
    pub fn parse_body(body: &str, page_size: u32) -> Result<Vec<RawItem>, FetchError> {
        let resp: SearchResponse =
            serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(resp
            .articles
            .into_iter()
            .take(page_size as usize)
            .map(RawItem::from_value)
            .collect())
    }

    fn map_transport(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

#[async_trait]
impl NewsProvider for PerigonProvider {
    async fn fetch(&self, req: &FetchRequest) -> Result<Vec<RawItem>, FetchError> {
        let api_key = self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)?;
        req.validate()?;

        let t0 = std::time::Instant::now();
        let page_size = req.page_size.to_string();
        let from = req.from.format("%Y-%m-%d").to_string();
        let sources = req.sources.join(",");
        let params: [(&str, &str); 5] = [
            ("apiKey", api_key),
            ("q", req.query.as_str()),
            ("from", from.as_str()),
            ("sources", sources.as_str()),
            ("pageSize", page_size.as_str()),
        ];

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_transport(e))?;
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        Self::parse_body(&body, req.page_size)
    }

    fn ready(&self) -> Result<(), ConfigError> {
        self.api_key
            .as_ref()
            .map(|_| ())
            .ok_or(ConfigError::MissingApiKey)
    }

    fn name(&self) -> &'static str {
        "perigon"
    }
}
