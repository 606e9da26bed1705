// src/store/mod.rs
//! Durable item persistence. The `url` uniqueness constraint enforced here is
//! the single source of truth for duplicate resolution.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::ingest::types::{Item, ItemId, NewItem};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn exists(&self, url: &str) -> Result<bool, StoreError>;

    /// Atomic insert. Either the item is durable with a fresh id or nothing is written.
    async fn insert(&self, item: &NewItem) -> Result<ItemId, StoreError>;

    /// Most recent items by `published_at`, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<Item>, StoreError>;

    fn name(&self) -> &'static str;
}
