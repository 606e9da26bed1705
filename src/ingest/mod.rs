// src/ingest/mod.rs
pub mod config;
pub mod dedup;
pub mod normalize;
pub mod providers;
pub mod scheduler;
pub mod types;

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, FetchError};
use crate::ingest::config::QueryProfile;
use crate::ingest::dedup::{Admission, DedupGate};
use crate::ingest::normalize::normalize;
use crate::ingest::types::{FetchRequest, NewsProvider};
use crate::store::ItemStore;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_cycles_total", "Ingestion cycles by final state.");
        describe_counter!(
            "ingest_items_fetched_total",
            "Raw items returned by the provider."
        );
        describe_counter!("ingest_items_stored_total", "New items persisted.");
        describe_counter!(
            "ingest_items_duplicate_total",
            "Items skipped because their url is already stored."
        );
        describe_counter!(
            "ingest_items_failed_total",
            "Items rejected by validation or persistence."
        );
        describe_counter!("ingest_fetch_errors_total", "Provider fetch failures.");
        describe_histogram!("ingest_fetch_ms", "Provider round-trip in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when the last cycle finished.");
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    Idle,
    Fetching,
    Processing,
    Completed,
    CompletedWithErrors,
    Aborted,
}

impl CycleState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CycleState::Completed | CycleState::CompletedWithErrors | CycleState::Aborted
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CycleState::Idle => "idle",
            CycleState::Fetching => "fetching",
            CycleState::Processing => "processing",
            CycleState::Completed => "completed",
            CycleState::CompletedWithErrors => "completed_with_errors",
            CycleState::Aborted => "aborted",
        }
    }
}

/// Why a cycle ended in `Aborted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbortReason {
    /// Fetching is disabled by configuration. Not an error.
    Skipped { reason: String },
    FetchFailed { status: String, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub url: Option<String>,
    pub reason: String,
}

/// Outcome report of one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub state: CycleState,
    pub abort: Option<AbortReason>,
    pub fetched: usize,
    pub skipped_duplicate: usize,
    pub stored: usize,
    pub failed: usize,
    /// Items never attempted because the store went away mid-cycle.
    pub unprocessed: usize,
    pub errors: Vec<ItemFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CycleSummary {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            state: CycleState::Idle,
            abort: None,
            fetched: 0,
            skipped_duplicate: 0,
            stored: 0,
            failed: 0,
            unprocessed: 0,
            errors: Vec::new(),
            started_at,
            finished_at: started_at,
        }
    }

    /// Aborted because fetching is disabled, as opposed to broken.
    pub fn is_skip(&self) -> bool {
        matches!(self.abort, Some(AbortReason::Skipped { .. }))
    }

    fn advance(&mut self, next: CycleState) {
        tracing::debug!(target: "ingest", from = self.state.as_str(), to = next.as_str(), "cycle transition");
        self.state = next;
    }

    fn record_failure(&mut self, url: Option<String>, reason: impl ToString) {
        self.failed += 1;
        self.errors.push(ItemFailure {
            url,
            reason: reason.to_string(),
        });
    }
}

/// Optional per-invocation overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRequest {
    #[serde(default)]
    pub query: Option<String>,
    /// Window start ("since").
    #[serde(default)]
    pub from: Option<NaiveDate>,
}

/// Runs fetch → normalize → dedup → persist cycles.
///
/// Cheap to share behind an `Arc`; concurrent cycles are allowed and rely on
/// the store's url constraint for correctness.
pub struct IngestRunner {
    provider: Arc<dyn NewsProvider>,
    gate: DedupGate,
    profile: QueryProfile,
}

impl IngestRunner {
    pub fn new(
        provider: Arc<dyn NewsProvider>,
        store: Arc<dyn ItemStore>,
        profile: QueryProfile,
    ) -> Self {
        Self {
            provider,
            gate: DedupGate::new(store),
            profile,
        }
    }

    pub fn profile(&self) -> &QueryProfile {
        &self.profile
    }

    pub fn fetch_request(&self, req: &CycleRequest, today: NaiveDate) -> FetchRequest {
        let from = req.from.unwrap_or_else(|| {
            today
                .checked_sub_days(Days::new(u64::from(self.profile.lookback_days)))
                .unwrap_or(today)
        });
        FetchRequest {
            query: req
                .query
                .clone()
                .unwrap_or_else(|| self.profile.query.clone()),
            from,
            sources: self.profile.sources.clone(),
            page_size: self.profile.page_size,
        }
    }

    pub async fn run_cycle(&self, req: &CycleRequest) -> CycleSummary {
        self.run_cycle_at(req, Utc::now()).await
    }

    /// Run one cycle with an explicit ingestion time. Never panics or errors:
    /// every failure ends up in the returned summary.
    pub async fn run_cycle_at(&self, req: &CycleRequest, now: DateTime<Utc>) -> CycleSummary {
        ensure_metrics_described();
        let mut summary = CycleSummary::new(now);
        let provider = self.provider.name();

        if let Err(e) = self.provider.ready() {
            return self.skip(summary, e);
        }

        let fetch_req = self.fetch_request(req, now.date_naive());
        if let Err(e) = fetch_req.validate() {
            return self.skip(summary, e);
        }

        summary.advance(CycleState::Fetching);
        let raw = match self.provider.fetch(&fetch_req).await {
            Ok(raw) => raw,
            Err(FetchError::Config(e)) => return self.skip(summary, e),
            Err(e) => {
                counter!("ingest_fetch_errors_total").increment(1);
                tracing::error!(target: "ingest", provider, status = %e.status(), error = %e, "fetch failed");
                summary.errors.push(ItemFailure {
                    url: None,
                    reason: e.to_string(),
                });
                summary.abort = Some(AbortReason::FetchFailed {
                    status: e.status(),
                    body: e.body(),
                });
                return self.finish(summary, CycleState::Aborted);
            }
        };

        summary.fetched = raw.len();
        counter!("ingest_items_fetched_total", "provider" => provider).increment(raw.len() as u64);
        summary.advance(CycleState::Processing);

        for (idx, item) in raw.iter().enumerate() {
            let new_item = match normalize(item, &self.profile.fallback_source, now) {
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!(target: "ingest", url = ?item.url, error = %e, "item rejected");
                    summary.record_failure(item.url.clone(), e);
                    continue;
                }
            };

            match self.gate.admit(&new_item).await {
                Ok(Admission::Stored(id)) => {
                    tracing::debug!(target: "ingest", %id, url = %new_item.url, "item stored");
                    summary.stored += 1;
                }
                Ok(Admission::Duplicate) => summary.skipped_duplicate += 1,
                Err(e) => {
                    // Store is gone; stop writing for this cycle.
                    tracing::error!(target: "ingest", error = %e, "store unavailable; abandoning remaining writes");
                    summary.record_failure(Some(new_item.url.clone()), e);
                    summary.unprocessed = raw.len() - idx - 1;
                    break;
                }
            }
        }

        let state = if summary.failed == 0 {
            CycleState::Completed
        } else {
            CycleState::CompletedWithErrors
        };
        self.finish(summary, state)
    }

    fn skip(&self, mut summary: CycleSummary, reason: ConfigError) -> CycleSummary {
        summary.abort = Some(AbortReason::Skipped {
            reason: reason.to_string(),
        });
        self.finish(summary, CycleState::Aborted)
    }

    fn finish(&self, mut summary: CycleSummary, state: CycleState) -> CycleSummary {
        summary.advance(state);
        summary.finished_at = Utc::now();

        counter!("ingest_cycles_total", "state" => state.as_str()).increment(1);
        counter!("ingest_items_stored_total").increment(summary.stored as u64);
        counter!("ingest_items_duplicate_total").increment(summary.skipped_duplicate as u64);
        counter!("ingest_items_failed_total").increment(summary.failed as u64);
        gauge!("ingest_last_run_ts").set(summary.finished_at.timestamp() as f64);

        let provider = self.provider.name();
        match (&summary.abort, state) {
            (Some(AbortReason::Skipped { reason }), _) => {
                tracing::info!(target: "ingest", provider, %reason, "ingest skipped");
            }
            (Some(AbortReason::FetchFailed { status, .. }), _) => {
                tracing::error!(target: "ingest", provider, %status, "ingest aborted");
            }
            (None, CycleState::CompletedWithErrors) => {
                tracing::warn!(
                    target: "ingest",
                    provider,
                    fetched = summary.fetched,
                    stored = summary.stored,
                    duplicates = summary.skipped_duplicate,
                    failed = summary.failed,
                    unprocessed = summary.unprocessed,
                    "ingest completed with errors"
                );
            }
            (None, _) => {
                tracing::info!(
                    target: "ingest",
                    provider,
                    fetched = summary.fetched,
                    stored = summary.stored,
                    duplicates = summary.skipped_duplicate,
                    "ingest completed"
                );
            }
        }
        summary
    }
}
