//! Bounded-concurrency dispatcher.

use crate::error::DispatchError;
use crate::progress::ProgressSink;
use crate::publisher::{PublishError, Publisher};
use crate::report::{DispatchReport, JobFailure, RunOutcome};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry_generator::{task_rng, MessageBuilder, Task, TaskPlan};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of one generate+publish job.
struct JobOutcome {
    task: Task,
    result: Result<(), PublishError>,
}

async fn execute_job<P: Publisher + ?Sized>(
    publisher: Arc<P>,
    builder: Arc<MessageBuilder>,
    task: Task,
    seed: Option<u64>,
) -> JobOutcome {
    let message = builder.build(task.entity_id, &mut task_rng(seed, task.index));
    let result = publisher.publish(&message).await;
    JobOutcome { task, result }
}

/// Counters for one run. Only the dispatcher loop mutates them.
struct DispatchState {
    total: u64,
    completed: u64,
    succeeded: u64,
    failures: Vec<JobFailure>,
    fatal: Option<PublishError>,
    peak_in_flight: usize,
    started: Instant,
}

impl DispatchState {
    fn new(total: u64) -> Self {
        Self {
            total,
            completed: 0,
            succeeded: 0,
            failures: Vec::new(),
            fatal: None,
            peak_in_flight: 0,
            started: Instant::now(),
        }
    }

    fn should_stop(&self, cancel: &CancellationToken) -> bool {
        self.fatal.is_some() || cancel.is_cancelled()
    }

    fn record(&mut self, joined: Result<JobOutcome, JoinError>, progress: &dyn ProgressSink) {
        self.completed += 1;

        match joined {
            Ok(JobOutcome { task, result: Ok(()) }) => {
                self.succeeded += 1;
                debug!(
                    "Published message {} for entity {}",
                    task.index, task.entity_id
                );
            }
            Ok(JobOutcome {
                task,
                result: Err(err),
            }) => {
                if err.is_fatal() {
                    error!(
                        "Fatal error publishing message {} for entity {}: {}",
                        task.index, task.entity_id, err
                    );
                    if self.fatal.is_none() {
                        self.fatal = Some(err.clone());
                    }
                } else {
                    warn!(
                        "Failed to publish message {} for entity {}: {}",
                        task.index, task.entity_id, err
                    );
                }
                self.failures.push(JobFailure {
                    task: Some(task),
                    reason: err.to_string(),
                });
            }
            Err(join_err) => {
                warn!("Publish job did not finish: {}", join_err);
                self.failures.push(JobFailure {
                    task: None,
                    reason: format!("job did not finish: {join_err}"),
                });
            }
        }

        progress.on_progress(self.completed, self.total);
    }

    fn finish(self) -> Result<DispatchReport, DispatchError> {
        let outcome = if self.fatal.is_some() {
            RunOutcome::Aborted
        } else if self.completed < self.total {
            RunOutcome::Cancelled
        } else {
            RunOutcome::Completed
        };

        let report = DispatchReport {
            outcome,
            total: self.total,
            completed: self.completed,
            succeeded: self.succeeded,
            failures: self.failures,
            peak_in_flight: self.peak_in_flight,
            elapsed: self.started.elapsed(),
        };

        match self.fatal {
            Some(source) => Err(DispatchError::Fatal {
                source,
                report: Box::new(report),
            }),
            None => Ok(report),
        }
    }
}

/// Runs generate+publish jobs with a cap on how many are in flight.
///
/// # Example
///
/// ```ignore
/// let dispatcher = BoundedDispatcher::new(publisher, MessageBuilder::from_config(&config), 8)
///     .with_seed(Some(42));
/// let report = dispatcher.run(TaskPlan::from_config(&config), &LogProgress::default()).await?;
/// report.log_summary();
/// ```
pub struct BoundedDispatcher<P: ?Sized> {
    publisher: Arc<P>,
    builder: Arc<MessageBuilder>,
    concurrency_limit: usize,
    seed: Option<u64>,
    cancel: CancellationToken,
}

impl<P: Publisher + ?Sized + 'static> BoundedDispatcher<P> {
    /// Create a dispatcher. A `concurrency_limit` of 0 is treated as 1.
    pub fn new(publisher: Arc<P>, builder: MessageBuilder, concurrency_limit: usize) -> Self {
        Self {
            publisher,
            builder: Arc::new(builder),
            concurrency_limit: concurrency_limit.max(1),
            seed: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Derive every task's RNG from `seed` (see [`task_rng`]).
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops scheduling when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Run every task of `plan`, keeping at most `concurrency_limit` jobs in
    /// flight.
    ///
    /// Returns once every scheduled job has completed. Job failures are
    /// collected in the report; a fatal publish error returns
    /// [`DispatchError::Fatal`] after the in-flight jobs have drained.
    pub async fn run(
        &self,
        plan: TaskPlan,
        progress: &dyn ProgressSink,
    ) -> Result<DispatchReport, DispatchError> {
        let mut state = DispatchState::new(plan.len());
        if plan.is_empty() {
            return state.finish();
        }

        info!(
            "Dispatching {} messages to {} (concurrency limit: {})",
            state.total,
            self.publisher.name(),
            self.concurrency_limit
        );

        let mut queue = plan.into_iter();
        let mut in_flight = JoinSet::new();

        loop {
            while in_flight.len() < self.concurrency_limit && !state.should_stop(&self.cancel) {
                let Some(task) = queue.next() else {
                    break;
                };
                in_flight.spawn(execute_job(
                    self.publisher.clone(),
                    self.builder.clone(),
                    task,
                    self.seed,
                ));
                state.peak_in_flight = state.peak_in_flight.max(in_flight.len());
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            state.record(joined, progress);
        }

        if queue.len() > 0 && self.cancel.is_cancelled() {
            info!(
                "Cancelled with {} of {} messages never scheduled",
                queue.len(),
                state.total
            );
        }

        state.finish()
    }

    /// Run every task of `plan` one at a time, sleeping `delay` between
    /// messages.
    ///
    /// Progress, failure collection and fatal handling match [`run`](Self::run).
    pub async fn run_sequential(
        &self,
        plan: TaskPlan,
        delay: Duration,
        progress: &dyn ProgressSink,
    ) -> Result<DispatchReport, DispatchError> {
        let mut state = DispatchState::new(plan.len());

        info!(
            "Sending {} messages to {} sequentially ({:?} between messages)",
            state.total,
            self.publisher.name(),
            delay
        );

        for task in plan {
            if state.should_stop(&self.cancel) {
                break;
            }

            if task.index > 0 && !delay.is_zero() {
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            state.peak_in_flight = 1;
            let outcome = execute_job(
                self.publisher.clone(),
                self.builder.clone(),
                task,
                self.seed,
            )
            .await;
            state.record(Ok(outcome), progress);
        }

        state.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use telemetry_core::{Message, SimulationConfig, ValueKind, ValueSpec};

    #[derive(Default)]
    struct MockPublisher {
        fail_on: Option<i64>,
        fatal_on: Option<i64>,
        panic_on: Option<i64>,
        delay: Duration,
        calls: AtomicU64,
        current: AtomicUsize,
        max_concurrent: AtomicUsize,
        messages: Mutex<Vec<Message>>,
    }

    #[async_trait]
    impl Publisher for MockPublisher {
        async fn publish(&self, message: &Message) -> Result<(), PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_concurrent.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.current.fetch_sub(1, Ordering::SeqCst);
            self.messages.lock().push(message.clone());

            let id = message.entity_id();
            if self.panic_on == Some(id) {
                panic!("mock publisher panicked on entity {id}");
            }
            if self.fatal_on == Some(id) {
                return Err(PublishError::fatal("authentication failed"));
            }
            if self.fail_on == Some(id) {
                return Err(PublishError::transient("timed out"));
            }
            Ok(())
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn builder() -> MessageBuilder {
        MessageBuilder::from_config(&SimulationConfig {
            values: vec![ValueSpec::new("temperature", 0.0, 50.0, ValueKind::Float)],
            ..SimulationConfig::default()
        })
    }

    fn dispatcher(publisher: Arc<MockPublisher>, limit: usize) -> BoundedDispatcher<MockPublisher> {
        BoundedDispatcher::new(publisher, builder(), limit)
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_complete() {
        let publisher = Arc::new(MockPublisher {
            delay: Duration::from_millis(2),
            ..Default::default()
        });
        let seen = Mutex::new(Vec::new());
        let sink = |completed: u64, total: u64| seen.lock().push((completed, total));

        let report = dispatcher(publisher.clone(), 4)
            .run(TaskPlan::new(4, 5, 1), &sink)
            .await
            .unwrap();

        let seen = seen.into_inner();
        let expected: Vec<(u64, u64)> = (1..=20).map(|c| (c, 20)).collect();
        assert_eq!(seen, expected);
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.completed, 20);
        assert_eq!(report.succeeded, 20);
        assert!(report.failures.is_empty());
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_limit() {
        let publisher = Arc::new(MockPublisher {
            delay: Duration::from_millis(2),
            ..Default::default()
        });

        let report = dispatcher(publisher.clone(), 4)
            .run(TaskPlan::new(10, 3, 1), &NoProgress)
            .await
            .unwrap();

        assert_eq!(report.peak_in_flight, 4);
        assert!(publisher.max_concurrent.load(Ordering::SeqCst) <= 4);
        assert!(publisher.max_concurrent.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_single_failure_does_not_stop_run() {
        let publisher = Arc::new(MockPublisher {
            fail_on: Some(3),
            ..Default::default()
        });
        let last = AtomicU64::new(0);
        let sink = |completed: u64, _total: u64| last.store(completed, Ordering::SeqCst);

        let report = dispatcher(publisher.clone(), 2)
            .run(TaskPlan::new(1, 5, 1), &sink)
            .await
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.completed, 5);
        assert_eq!(report.succeeded, 4);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].task.map(|t| t.entity_id), Some(3));
        assert_eq!(last.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_fatal_error_stops_scheduling_and_drains() {
        let publisher = Arc::new(MockPublisher {
            fatal_on: Some(5),
            ..Default::default()
        });

        let err = dispatcher(publisher.clone(), 2)
            .run(TaskPlan::new(1, 50, 1), &NoProgress)
            .await
            .unwrap_err();

        let DispatchError::Fatal { source, report } = &err;
        assert!(source.is_fatal());
        assert_eq!(report.outcome, RunOutcome::Aborted);
        assert!(report.completed >= 5);
        assert!(report.completed < 50);
        // every job that started was awaited
        assert_eq!(publisher.calls.load(Ordering::SeqCst), report.completed);
    }

    #[tokio::test]
    async fn test_empty_plan_resolves_immediately() {
        let publisher = Arc::new(MockPublisher::default());
        let calls = AtomicU64::new(0);
        let sink = |_: u64, _: u64| {
            calls.fetch_add(1, Ordering::SeqCst);
        };

        let report = dispatcher(publisher.clone(), 4)
            .run(TaskPlan::new(0, 10, 1), &sink)
            .await
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.total, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_plan_ending_at_max_id_completes() {
        let publisher = Arc::new(MockPublisher::default());

        let report = dispatcher(publisher.clone(), 2)
            .run(TaskPlan::new(1, 3, i64::MAX - 1), &NoProgress)
            .await
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.total, 2);
        assert_eq!(report.completed, 2);
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_limit_clamped_to_one() {
        let publisher = Arc::new(MockPublisher {
            delay: Duration::from_millis(1),
            ..Default::default()
        });
        let dispatcher = dispatcher(publisher.clone(), 0);
        assert_eq!(dispatcher.concurrency_limit(), 1);

        let report = dispatcher
            .run(TaskPlan::new(2, 2, 1), &NoProgress)
            .await
            .unwrap();

        assert_eq!(report.peak_in_flight, 1);
        assert_eq!(publisher.max_concurrent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_before_run() {
        let publisher = Arc::new(MockPublisher::default());
        let dispatcher = dispatcher(publisher.clone(), 4);
        dispatcher.cancellation_token().cancel();

        let report = dispatcher
            .run(TaskPlan::new(3, 3, 1), &NoProgress)
            .await
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.completed, 0);
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_run_drains_in_flight() {
        let publisher = Arc::new(MockPublisher::default());
        let token = CancellationToken::new();
        let dispatcher = dispatcher(publisher.clone(), 1).with_cancellation(token.clone());
        let sink = |completed: u64, _: u64| {
            if completed == 3 {
                token.cancel();
            }
        };

        let report = dispatcher
            .run(TaskPlan::new(1, 10, 1), &sink)
            .await
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.completed, 3);
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_panicking_job_counts_as_failure() {
        let publisher = Arc::new(MockPublisher {
            panic_on: Some(2),
            ..Default::default()
        });

        let report = dispatcher(publisher.clone(), 2)
            .run(TaskPlan::new(1, 4, 1), &NoProgress)
            .await
            .unwrap();

        assert_eq!(report.completed, 4);
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].task, None);
    }

    #[tokio::test]
    async fn test_seeded_runs_generate_same_messages() {
        async fn collect(limit: usize) -> Vec<Message> {
            let publisher = Arc::new(MockPublisher {
                delay: Duration::from_millis(1),
                ..Default::default()
            });
            dispatcher(publisher.clone(), limit)
                .with_seed(Some(42))
                .run(TaskPlan::new(1, 12, 1), &NoProgress)
                .await
                .unwrap();
            let mut messages = publisher.messages.lock().clone();
            messages.sort_by_key(Message::entity_id);
            messages
        }

        let sequential = collect(1).await;
        let concurrent = collect(6).await;
        assert_eq!(sequential.len(), 12);
        assert_eq!(sequential, concurrent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_mode_paces_messages() {
        let publisher = Arc::new(MockPublisher::default());
        let seen = Mutex::new(Vec::new());
        let sink = |completed: u64, _: u64| seen.lock().push(completed);
        let delay = Duration::from_millis(500);

        let start = tokio::time::Instant::now();
        let report = dispatcher(publisher.clone(), 8)
            .run_sequential(TaskPlan::new(2, 2, 1), delay, &sink)
            .await
            .unwrap();

        assert!(start.elapsed() >= delay * 3);
        assert_eq!(seen.into_inner(), vec![1, 2, 3, 4]);
        assert_eq!(report.completed, 4);
        assert_eq!(report.peak_in_flight, 1);
        assert_eq!(publisher.max_concurrent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sequential_mode_stops_on_fatal() {
        let publisher = Arc::new(MockPublisher {
            fatal_on: Some(2),
            ..Default::default()
        });

        let err = dispatcher(publisher.clone(), 1)
            .run_sequential(TaskPlan::new(1, 5, 1), Duration::ZERO, &NoProgress)
            .await
            .unwrap_err();

        assert_eq!(err.report().completed, 2);
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 2);
    }
}
