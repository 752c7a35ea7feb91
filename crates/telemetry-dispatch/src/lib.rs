//! Bounded-concurrency dispatch for the IoT telemetry simulator.
//!
//! The dispatcher runs one job per planned task. A job builds the message for
//! its entity and hands it to a [`Publisher`]. At most `concurrency_limit`
//! jobs are in flight; every completion, successful or not, bumps the
//! completed count and notifies the [`ProgressSink`].
//!
//! ```text
//!   TaskPlan ──▶ queue ──▶ ┌──────────────────────────┐
//!                          │ JoinSet (≤ limit jobs)   │
//!                          │  build ─▶ publish        │
//!                          └────────────┬─────────────┘
//!                                       ▼
//!                          DispatchState (completed, failures)
//!                                       │
//!                                       ├──▶ ProgressSink
//!                                       ▼
//!                                DispatchReport
//! ```
//!
//! A single job failure is collected and the run goes on. A fatal publish
//! error, or cancellation, stops new jobs from starting; jobs already in
//! flight are drained before `run` returns.

pub mod dispatcher;
pub mod error;
pub mod progress;
pub mod publisher;
pub mod report;

// Re-exports for convenience
pub use dispatcher::BoundedDispatcher;
pub use error::DispatchError;
pub use progress::{LogProgress, NoProgress, ProgressSink};
pub use publisher::{PublishError, Publisher};
pub use report::{DispatchReport, JobFailure, RunOutcome};
