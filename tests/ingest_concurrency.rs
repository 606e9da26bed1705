// tests/ingest_concurrency.rs
use std::sync::Arc;

use async_trait::async_trait;
use intel_radar::ingest::config::QueryProfile;
use intel_radar::ingest::providers::fixture::StaticProvider;
use intel_radar::ingest::types::{Item, ItemId, NewItem, RawItem};
use intel_radar::store::{ItemStore, MemoryStore, SqliteStore};
use intel_radar::{CycleRequest, CycleState, IngestRunner, StoreError};

/// Store whose existence check always misses, as if every cycle raced.
struct StaleGateStore<S> {
    inner: S,
}

#[async_trait]
impl<S: ItemStore> ItemStore for StaleGateStore<S> {
    async fn exists(&self, _url: &str) -> Result<bool, StoreError> {
        Ok(false)
    }
    async fn insert(&self, item: &NewItem) -> Result<ItemId, StoreError> {
        self.inner.insert(item).await
    }
    async fn recent(&self, limit: usize) -> Result<Vec<Item>, StoreError> {
        self.inner.recent(limit).await
    }
    fn name(&self) -> &'static str {
        "stale-gate"
    }
}

fn items(range: std::ops::Range<u32>) -> Vec<RawItem> {
    range
        .map(|i| RawItem::new(format!("https://news.test/{i}"), format!("Item {i}")))
        .collect()
}

async fn race(store: Arc<dyn ItemStore>) {
    let a = Arc::new(IngestRunner::new(
        Arc::new(StaticProvider::new(items(0..20))),
        store.clone(),
        QueryProfile::default(),
    ));
    let b = Arc::new(IngestRunner::new(
        Arc::new(StaticProvider::new(items(10..30))),
        store.clone(),
        QueryProfile::default(),
    ));

    let ha = tokio::spawn({
        let a = a.clone();
        async move { a.run_cycle(&CycleRequest::default()).await }
    });
    let hb = tokio::spawn({
        let b = b.clone();
        async move { b.run_cycle(&CycleRequest::default()).await }
    });
    let (sa, sb) = (ha.await.unwrap(), hb.await.unwrap());

    for s in [&sa, &sb] {
        assert_eq!(s.state, CycleState::Completed, "{s:?}");
        assert_eq!(s.failed, 0);
        assert_eq!(s.fetched, 20);
        assert_eq!(s.stored + s.skipped_duplicate, 20);
    }
    // 30 distinct urls, 10 of them contested.
    assert_eq!(sa.stored + sb.stored, 30);
    assert_eq!(sa.skipped_duplicate + sb.skipped_duplicate, 10);

    let stored = store.recent(100).await.unwrap();
    assert_eq!(stored.len(), 30);
    let mut urls: Vec<_> = stored.iter().map(|i| i.url.clone()).collect();
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), 30);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cycles_store_each_url_once_in_memory() {
    race(Arc::new(MemoryStore::new())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cycles_store_each_url_once_in_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("intel.db")).unwrap();
    race(Arc::new(store)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn insert_time_conflict_counts_as_duplicate() {
    // The gate never sees existing rows; only the unique constraint protects us.
    race(Arc::new(StaleGateStore {
        inner: SqliteStore::open_in_memory().unwrap(),
    }))
    .await;
}

#[tokio::test]
async fn stale_gate_second_writer_is_skipped_not_failed() {
    let store: Arc<dyn ItemStore> = Arc::new(StaleGateStore {
        inner: MemoryStore::new(),
    });
    let runner = IngestRunner::new(
        Arc::new(StaticProvider::new(items(0..3))),
        store.clone(),
        QueryProfile::default(),
    );
    runner.run_cycle(&CycleRequest::default()).await;
    let again = runner.run_cycle(&CycleRequest::default()).await;
    assert_eq!(again.state, CycleState::Completed);
    assert_eq!(again.skipped_duplicate, 3);
    assert_eq!(again.failed, 0);
}
