//! Error types for the dispatcher.

use crate::publisher::PublishError;
use crate::report::DispatchReport;
use thiserror::Error;

/// Errors that end a run.
///
/// Per-job failures are not errors; they are collected in the
/// [`DispatchReport`].
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A fatal publish error stopped scheduling. In-flight jobs were drained
    /// and the partial report is attached.
    #[error("run aborted after {} of {} messages: {source}", .report.completed, .report.total)]
    Fatal {
        source: PublishError,
        report: Box<DispatchReport>,
    },
}

impl DispatchError {
    /// Report of the run up to the point it stopped.
    pub fn report(&self) -> &DispatchReport {
        match self {
            DispatchError::Fatal { report, .. } => report,
        }
    }
}
