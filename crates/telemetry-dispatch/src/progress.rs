//! Progress reporting.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Receives `(completed, total)` after every job completion.
///
/// The dispatcher calls this from its own loop only, so calls for one run
/// never overlap and `completed` strictly increases by one per call.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, completed: u64, total: u64);
}

impl<F> ProgressSink for F
where
    F: Fn(u64, u64) + Send + Sync,
{
    fn on_progress(&self, completed: u64, total: u64) {
        self(completed, total)
    }
}

/// Discards progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _completed: u64, _total: u64) {}
}

/// Logs progress whenever the whole percentage changes.
#[derive(Debug)]
pub struct LogProgress {
    label: String,
    last_percent: AtomicU64,
}

impl LogProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            last_percent: AtomicU64::new(u64::MAX),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new("Sent message")
    }
}

/// Whole percentage of `completed` over `total`.
pub fn percent(completed: u64, total: u64) -> u64 {
    if total == 0 {
        return 100;
    }
    (u128::from(completed) * 100 / u128::from(total)) as u64
}

impl ProgressSink for LogProgress {
    fn on_progress(&self, completed: u64, total: u64) {
        let pct = percent(completed, total);
        let previous = self.last_percent.swap(pct, Ordering::Relaxed);
        if previous != pct {
            info!("{} {} of {} ({}%)", self.label, completed, total, pct);
        }
    }
}
