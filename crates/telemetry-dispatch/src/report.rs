//! Run report produced at drain time.

use std::time::Duration;
use telemetry_generator::Task;
use tracing::{info, warn};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every planned task ran (some may have failed).
    Completed,
    /// Cancellation stopped scheduling before the plan was exhausted.
    Cancelled,
    /// A fatal publish error stopped scheduling.
    Aborted,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Completed => write!(f, "completed"),
            RunOutcome::Cancelled => write!(f, "cancelled"),
            RunOutcome::Aborted => write!(f, "aborted"),
        }
    }
}

/// A job that did not deliver its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    /// The task, unless the job panicked before reporting back
    pub task: Option<Task>,
    pub reason: String,
}

/// Aggregate result of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub outcome: RunOutcome,
    /// Planned tasks
    pub total: u64,
    /// Jobs that finished, successfully or not
    pub completed: u64,
    pub succeeded: u64,
    pub failures: Vec<JobFailure>,
    /// Highest number of jobs in flight at once
    pub peak_in_flight: usize,
    pub elapsed: Duration,
}

impl DispatchReport {
    pub fn failed(&self) -> u64 {
        self.failures.len() as u64
    }

    pub fn is_clean(&self) -> bool {
        self.outcome == RunOutcome::Completed && self.failures.is_empty()
    }

    /// Messages per second over the whole run.
    pub fn messages_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.succeeded as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Log the one-line summary printed after every run.
    pub fn log_summary(&self) {
        info!(
            "Run {}: {} succeeded, {} failed, {} of {} completed in {:?} ({:.2} msg/sec)",
            self.outcome,
            self.succeeded,
            self.failed(),
            self.completed,
            self.total,
            self.elapsed,
            self.messages_per_second()
        );
        if !self.failures.is_empty() {
            warn!(
                "{} message(s) were not delivered; first failure: {}",
                self.failures.len(),
                self.failures[0].reason
            );
        }
    }
}
