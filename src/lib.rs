// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod ingest;
pub mod metrics;
pub mod store;

use std::sync::Arc;

use anyhow::{Context, Result};

pub use crate::api::{router, AppState};
pub use crate::error::{ConfigError, FetchError, StoreError, ValidationError};
pub use crate::ingest::{CycleRequest, CycleState, CycleSummary, IngestRunner};

use crate::config::Settings;
use crate::history::CycleHistory;
use crate::ingest::config::QueryProfile;
use crate::ingest::providers::perigon::PerigonProvider;
use crate::store::{ItemStore, SqliteStore};

/// Cycle summaries kept for `/api/ingest/history`.
pub const HISTORY_CAPACITY: usize = 200;

/// Open the store and wire the Perigon-backed runner from settings.
///
/// A missing API key is not an error here: cycles run by the returned state
/// end as skips until a key is configured.
pub fn build_state(settings: &Settings, profile: QueryProfile) -> Result<AppState> {
    let store: Arc<dyn ItemStore> = Arc::new(
        SqliteStore::connect(&settings.database_url)
            .with_context(|| format!("opening store at {}", settings.database_url))?,
    );
    let provider = PerigonProvider::new(profile.endpoint.clone(), settings.api_key.clone())
        .with_timeout(settings.fetch_timeout);
    let runner = IngestRunner::new(Arc::new(provider), store.clone(), profile);
    Ok(AppState {
        store,
        runner: Arc::new(runner),
        history: Arc::new(CycleHistory::with_capacity(HISTORY_CAPACITY)),
    })
}
