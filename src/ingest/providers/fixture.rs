// src/ingest/providers/fixture.rs
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{ConfigError, FetchError};
use crate::ingest::providers::perigon::PerigonProvider;
use crate::ingest::types::{FetchRequest, NewsProvider, RawItem};

enum Mode {
    Items(Vec<RawItem>),
    Fail(FetchError),
    Disabled(ConfigError),
}

/// Provider that serves a canned page. Used by demos and tests.
pub struct StaticProvider {
    mode: Mode,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(items: Vec<RawItem>) -> Self {
        Self::with_mode(Mode::Items(items))
    }

    /// Parse a Perigon-shaped JSON body (`{"articles": [...]}`).
    pub fn from_fixture_str(body: &str) -> Result<Self, FetchError> {
        let items = PerigonProvider::parse_body(body, u32::MAX)?;
        Ok(Self::new(items))
    }

    /// Every fetch fails with `err`.
    pub fn failing(err: FetchError) -> Self {
        Self::with_mode(Mode::Fail(err))
    }

    /// `ready()` reports `err`, as an unconfigured provider would.
    pub fn disabled(err: ConfigError) -> Self {
        Self::with_mode(Mode::Disabled(err))
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `fetch` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsProvider for StaticProvider {
    async fn fetch(&self, req: &FetchRequest) -> Result<Vec<RawItem>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            Mode::Items(items) => Ok(items
                .iter()
                .take(req.page_size as usize)
                .cloned()
                .collect()),
            Mode::Fail(err) => Err(err.clone()),
            Mode::Disabled(err) => Err(FetchError::Config(err.clone())),
        }
    }

    fn ready(&self) -> Result<(), ConfigError> {
        match &self.mode {
            Mode::Disabled(err) => Err(err.clone()),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
