// tests/ingest_scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use intel_radar::history::CycleHistory;
use intel_radar::ingest::config::QueryProfile;
use intel_radar::ingest::providers::fixture::StaticProvider;
use intel_radar::ingest::scheduler::{spawn_scheduler, IngestSchedulerCfg};
use intel_radar::ingest::types::RawItem;
use intel_radar::store::MemoryStore;
use intel_radar::{CycleState, IngestRunner};

#[tokio::test(start_paused = true)]
async fn scheduler_runs_cycles_on_each_tick() {
    let provider = Arc::new(StaticProvider::new(vec![RawItem::new("https://a", "A")]));
    let store = Arc::new(MemoryStore::new());
    let runner = Arc::new(IngestRunner::new(
        provider.clone(),
        store.clone(),
        QueryProfile::default(),
    ));
    let history = Arc::new(CycleHistory::with_capacity(10));

    let handle = spawn_scheduler(
        IngestSchedulerCfg {
            interval: Duration::from_secs(60),
        },
        runner,
        history.clone(),
    );

    // First tick fires immediately, then one per minute.
    tokio::time::sleep(Duration::from_secs(150)).await;
    handle.abort();

    assert_eq!(provider.calls(), 3);
    let runs = history.snapshot_last_n(10);
    assert_eq!(runs.len(), 3);
    assert_eq!(runs[0].stored, 1);
    assert!(runs[1..].iter().all(|s| s.skipped_duplicate == 1));
    assert!(runs.iter().all(|s| s.state == CycleState::Completed));
    assert_eq!(store.len(), 1);
}
