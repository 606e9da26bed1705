// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::history::CycleHistory;
use crate::ingest::{CycleRequest, IngestRunner};

#[derive(Clone, Copy, Debug)]
pub struct IngestSchedulerCfg {
    pub interval: Duration,
}

/// Spawn a background task that runs one cycle per tick, starting immediately.
///
/// Cycles triggered elsewhere (e.g. the HTTP trigger) are not serialized
/// against this loop.
pub fn spawn_scheduler(
    cfg: IngestSchedulerCfg,
    runner: Arc<IngestRunner>,
    history: Arc<CycleHistory>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cfg.interval);
        // A slow cycle must not cause a burst of catch-up cycles.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let summary = runner.run_cycle(&CycleRequest::default()).await;
            tracing::debug!(
                target: "ingest",
                state = summary.state.as_str(),
                stored = summary.stored,
                "scheduled cycle finished"
            );
            history.push(summary);
        }
    })
}
