// src/store/memory.rs
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::ItemStore;
use crate::error::StoreError;
use crate::ingest::types::{Item, ItemId, NewItem};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    by_url: HashMap<String, Item>,
}

/// Process-local store. Check-and-insert happens under one lock, so the
/// uniqueness guarantee matches the SQLite backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|g| g.by_url.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, url: &str) -> Option<Item> {
        self.inner.lock().ok()?.by_url.get(url).cloned()
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn exists(&self, url: &str) -> Result<bool, StoreError> {
        let g = self.inner.lock().map_err(StoreError::unavailable)?;
        Ok(g.by_url.contains_key(url))
    }

    async fn insert(&self, item: &NewItem) -> Result<ItemId, StoreError> {
        let mut g = self.inner.lock().map_err(StoreError::unavailable)?;
        if g.by_url.contains_key(&item.url) {
            return Err(StoreError::DuplicateKey(item.url.clone()));
        }
        g.next_id += 1;
        let id = ItemId(g.next_id);
        g.by_url
            .insert(item.url.clone(), Item::from_new(id, item.clone()));
        Ok(id)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Item>, StoreError> {
        let g = self.inner.lock().map_err(StoreError::unavailable)?;
        let mut items: Vec<Item> = g.by_url.values().cloned().collect();
        items.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        items.truncate(limit);
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn item(url: &str, age_mins: i64) -> NewItem {
        NewItem {
            source: "perigon".into(),
            title: url.into(),
            url: url.into(),
            published_at: Utc::now() - Duration::minutes(age_mins),
            summary: String::new(),
        }
    }

    #[tokio::test]
    async fn second_insert_of_same_url_is_duplicate_key() {
        let store = MemoryStore::new();
        let id = store.insert(&item("https://a.test", 0)).await.unwrap();
        assert_eq!(id, ItemId(1));
        let err = store.insert(&item("https://a.test", 0)).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateKey("https://a.test".into()));
        assert!(store.exists("https://a.test").await.unwrap());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn recent_is_newest_first_and_bounded() {
        let store = MemoryStore::new();
        store.insert(&item("https://old.test", 60)).await.unwrap();
        store.insert(&item("https://new.test", 1)).await.unwrap();
        store.insert(&item("https://mid.test", 30)).await.unwrap();
        let rows = store.recent(2).await.unwrap();
        let urls: Vec<_> = rows.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["https://new.test", "https://mid.test"]);
    }
}
