// src/ingest/dedup.rs
use std::sync::Arc;

use crate::error::StoreError;
use crate::ingest::types::{ItemId, NewItem};
use crate::store::ItemStore;

/// Outcome of passing one item through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Stored(ItemId),
    Duplicate,
}

/// Pre-write existence check in front of the store.
///
/// The lookup only saves a write attempt; a `DuplicateKey` raised by the
/// store at insert time is folded into `Admission::Duplicate` as well.
#[derive(Clone)]
pub struct DedupGate {
    store: Arc<dyn ItemStore>,
}

impl DedupGate {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    pub async fn exists(&self, url: &str) -> Result<bool, StoreError> {
        self.store.exists(url).await
    }

    /// Check, then insert. Only `StoreError::Unavailable` escapes.
    pub async fn admit(&self, item: &NewItem) -> Result<Admission, StoreError> {
        if self.exists(&item.url).await? {
            return Ok(Admission::Duplicate);
        }
        match self.store.insert(item).await {
            Ok(id) => Ok(Admission::Stored(id)),
            Err(StoreError::DuplicateKey(url)) => {
                tracing::debug!(target: "ingest", %url, "lost insert race; treating as duplicate");
                Ok(Admission::Duplicate)
            }
            Err(e) => Err(e),
        }
    }
}
