// tests/ingest_dedup.rs
use std::sync::Arc;

use intel_radar::ingest::config::QueryProfile;
use intel_radar::ingest::providers::fixture::StaticProvider;
use intel_radar::ingest::types::RawItem;
use intel_radar::store::{ItemStore, MemoryStore};
use intel_radar::{CycleRequest, CycleState, IngestRunner};

fn page() -> Vec<RawItem> {
    vec![
        RawItem::new("https://news.test/1", "One"),
        RawItem::new("https://news.test/2", "Two"),
        RawItem::new("https://news.test/3", "Three"),
    ]
}

#[tokio::test]
async fn repeated_cycles_store_each_url_once() {
    let store = Arc::new(MemoryStore::new());
    let runner = IngestRunner::new(
        Arc::new(StaticProvider::new(page())),
        store.clone(),
        QueryProfile::default(),
    );

    let first = runner.run_cycle(&CycleRequest::default()).await;
    assert_eq!(first.state, CycleState::Completed);
    assert_eq!(first.stored, 3);
    assert_eq!(first.skipped_duplicate, 0);

    let second = runner.run_cycle(&CycleRequest::default()).await;
    assert_eq!(second.state, CycleState::Completed);
    assert_eq!(second.fetched, 3);
    assert_eq!(second.stored, 0);
    assert_eq!(second.skipped_duplicate, 3);
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn overlapping_windows_only_store_new_urls() {
    let store = Arc::new(MemoryStore::new());
    let first = IngestRunner::new(
        Arc::new(StaticProvider::new(page())),
        store.clone(),
        QueryProfile::default(),
    );
    first.run_cycle(&CycleRequest::default()).await;

    let mut next_page = page();
    next_page.push(RawItem::new("https://news.test/4", "Four"));
    let second = IngestRunner::new(
        Arc::new(StaticProvider::new(next_page)),
        store.clone(),
        QueryProfile::default(),
    );
    let s = second.run_cycle(&CycleRequest::default()).await;
    assert_eq!(s.stored, 1);
    assert_eq!(s.skipped_duplicate, 3);
    assert_eq!(store.recent(10).await.unwrap().len(), 4);
}

#[tokio::test]
async fn same_url_twice_in_one_page_keeps_first_write() {
    let store = Arc::new(MemoryStore::new());
    let runner = IngestRunner::new(
        Arc::new(StaticProvider::new(vec![
            RawItem::new("https://a", "A"),
            RawItem::new("https://a", "A-dup"),
        ])),
        store.clone(),
        QueryProfile::default(),
    );

    let s = runner.run_cycle(&CycleRequest::default()).await;
    assert_eq!(s.stored, 1);
    assert_eq!(s.skipped_duplicate, 1);
    assert_eq!(s.failed, 0);
    assert_eq!(s.state, CycleState::Completed);
    assert_eq!(store.get("https://a").expect("stored").title, "A");
}
