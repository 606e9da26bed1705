//! history.rs: bounded in-memory log of recent cycle summaries.

use std::sync::Mutex;

use crate::ingest::CycleSummary;

const MAX_CAP: usize = 10_000;

#[derive(Debug)]
pub struct CycleHistory {
    inner: Mutex<Vec<CycleSummary>>,
    cap: usize,
}

impl CycleHistory {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.clamp(1, MAX_CAP);
        Self {
            inner: Mutex::new(Vec::with_capacity(cap)),
            cap,
        }
    }

    pub fn push(&self, summary: CycleSummary) {
        let mut v = match self.inner.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        v.push(summary);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    /// Newest last.
    pub fn snapshot_last_n(&self, n: usize) -> Vec<CycleSummary> {
        let v = match self.inner.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        let start = v.len().saturating_sub(n);
        v[start..].to_vec()
    }

    pub fn last(&self) -> Option<CycleSummary> {
        self.snapshot_last_n(1).pop()
    }
}
