//! Background execution of calculation tasks.
//!
//! Accepted tasks are submitted to a [`JobQueue`]. A single dispatcher task
//! drains the queue and runs every job in its own `tokio` task, so jobs of
//! different owners proceed independently. [`TaskExecutor::execute`] is the
//! error boundary: whatever goes wrong is written back into the task record
//! and never returned to anyone. A job that panics is marked failed by the
//! task that spawned it.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{CalculationJob, TaskPatch, TaskStatus};
use crate::store::{BulkContributionRunner, SummaryReader, TaskStore};

/// Drives one job through `processing` to a terminal status.
#[derive(Clone)]
pub struct TaskExecutor {
    tasks: Arc<dyn TaskStore>,
    bulk: Arc<dyn BulkContributionRunner>,
    summaries: Arc<dyn SummaryReader>,
}

impl TaskExecutor {
    /// Creates an executor over the given collaborators.
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        bulk: Arc<dyn BulkContributionRunner>,
        summaries: Arc<dyn SummaryReader>,
    ) -> Self {
        Self {
            tasks,
            bulk,
            summaries,
        }
    }

    /// Executes `job`, folding any failure into the task record.
    ///
    /// A task cancelled before pickup is left alone. Once running, the final
    /// status write is unconditional and replaces a `cancelled` status
    /// written in the meantime.
    pub async fn execute(&self, job: CalculationJob) {
        info!(task_id = %job.task_id, owner = %job.owner, "Starting calculation task");

        match self.run(&job).await {
            Ok(()) => info!(task_id = %job.task_id, "Calculation task completed"),
            Err(err) => {
                error!(task_id = %job.task_id, error = %err, "Calculation task failed");
                self.record_failure(&job, &err).await;
            }
        }
    }

    /// Marks the task failed with `err` as its message.
    pub(crate) async fn record_failure(&self, job: &CalculationJob, err: &EngineError) {
        let patch = TaskPatch::failed(err.to_string(), Utc::now());
        if let Err(write_err) = self.tasks.update_task(job.task_id, &job.owner, patch).await {
            error!(
                task_id = %job.task_id,
                error = %write_err,
                "Could not record task failure"
            );
        }
    }

    async fn run(&self, job: &CalculationJob) -> EngineResult<()> {
        let current = self
            .tasks
            .get_task(job.task_id, &job.owner)
            .await?
            .ok_or_else(|| EngineError::not_found("Task"))?;
        if current.status == TaskStatus::Cancelled {
            info!(task_id = %job.task_id, "Task was cancelled before it started");
            return Ok(());
        }

        self.tasks
            .update_task(job.task_id, &job.owner, TaskPatch::started(Utc::now()))
            .await?;

        let outcome = self
            .bulk
            .run_batch(job)
            .await?
            .ok_or_else(|| EngineError::internal("Bulk contribution run returned no outcome"))?;

        if !outcome.success {
            let message = if outcome.message.is_empty() {
                "Bulk contribution run failed".to_string()
            } else {
                outcome.message
            };
            return Err(EngineError::internal(message));
        }

        debug!(
            task_id = %job.task_id,
            processed = outcome.processed_count,
            errors = outcome.error_count,
            "Bulk contribution run succeeded"
        );

        let summary = self
            .summaries
            .aggregate_summary(&job.owner, job.year)
            .await?
            .ok_or_else(|| EngineError::internal("Calculation summary is unavailable"))?;

        let note = if outcome.error_count > 0 {
            warn!(
                task_id = %job.task_id,
                error_count = outcome.error_count,
                "Calculation completed with failed records"
            );
            Some(format!(
                "Calculation completed, but {} records failed",
                outcome.error_count
            ))
        } else {
            None
        };

        self.tasks
            .update_task(
                job.task_id,
                &job.owner,
                TaskPatch::completed(outcome.processed_count, summary, note, Utc::now()),
            )
            .await?;

        Ok(())
    }
}

/// The submission side of the background worker.
///
/// Dropping every clone of the queue closes the channel and lets the
/// dispatcher exit once it has handed out the remaining jobs.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<CalculationJob>,
}

impl JobQueue {
    /// Spawns the dispatcher and returns the queue feeding it.
    ///
    /// Must be called from within a `tokio` runtime.
    pub fn start(executor: TaskExecutor) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<CalculationJob>();
        let executor = Arc::new(executor);

        let dispatcher = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                tokio::spawn(supervise(executor.clone(), job));
            }
            debug!("Job queue closed");
        });

        (Self { sender }, dispatcher)
    }

    /// Submits a job without waiting for it.
    pub fn submit(&self, job: CalculationJob) -> EngineResult<()> {
        self.sender
            .send(job)
            .map_err(|_| EngineError::internal("Calculation worker is not running"))
    }
}

/// Runs `job` in its own task and marks it failed if that task panics.
async fn supervise(executor: Arc<TaskExecutor>, job: CalculationJob) {
    let worker = tokio::spawn({
        let executor = executor.clone();
        let job = job.clone();
        async move { executor.execute(job).await }
    });

    match worker.await {
        Ok(()) => {}
        Err(err) if err.is_panic() => {
            error!(task_id = %job.task_id, "Calculation worker panicked");
            executor
                .record_failure(&job, &EngineError::internal("Calculation worker panicked"))
                .await;
        }
        Err(err) => warn!(task_id = %job.task_id, error = %err, "Calculation worker was cancelled"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BatchOutcome, CalculationTask, TaskSummary};
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::time::Duration;
    use tokio::sync::Notify;
    use uuid::Uuid;

    struct FixedRunner(Option<BatchOutcome>);

    #[async_trait]
    impl BulkContributionRunner for FixedRunner {
        async fn run_batch(&self, _job: &CalculationJob) -> EngineResult<Option<BatchOutcome>> {
            Ok(self.0.clone())
        }
    }

    struct ErroringRunner;

    #[async_trait]
    impl BulkContributionRunner for ErroringRunner {
        async fn run_batch(&self, _job: &CalculationJob) -> EngineResult<Option<BatchOutcome>> {
            Err(EngineError::internal("database connection lost"))
        }
    }

    struct PanickingRunner;

    #[async_trait]
    impl BulkContributionRunner for PanickingRunner {
        async fn run_batch(&self, _job: &CalculationJob) -> EngineResult<Option<BatchOutcome>> {
            panic!("attempt to add with overflow");
        }
    }

    /// Holds the run until the gate is opened.
    struct GatedRunner(Arc<Notify>);

    #[async_trait]
    impl BulkContributionRunner for GatedRunner {
        async fn run_batch(&self, _job: &CalculationJob) -> EngineResult<Option<BatchOutcome>> {
            self.0.notified().await;
            Ok(Some(outcome(true, 2, 0)))
        }
    }

    struct FixedSummary(Option<TaskSummary>);

    #[async_trait]
    impl SummaryReader for FixedSummary {
        async fn aggregate_summary(&self, _owner: &str, _year: i32) -> EngineResult<Option<TaskSummary>> {
            Ok(self.0.clone())
        }
    }

    fn summary() -> TaskSummary {
        TaskSummary {
            employee_count: 2,
            total_company_cost: Decimal::new(4000, 0),
            total_employee_cost: Decimal::new(2000, 0),
            avg_cost_per_employee: Decimal::new(3000, 0),
        }
    }

    fn outcome(success: bool, processed: u32, errors: u32) -> BatchOutcome {
        BatchOutcome {
            success,
            message: if success { String::new() } else { "rate table missing".to_string() },
            processed_count: processed,
            error_count: errors,
        }
    }

    async fn wait_for_status(
        store: &InMemoryStore,
        id: Uuid,
        done: impl Fn(TaskStatus) -> bool,
    ) -> TaskStatus {
        let mut status = TaskStatus::Pending;
        for _ in 0..200 {
            status = store.get_task(id, "user_1").await.unwrap().unwrap().status;
            if done(status) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        status
    }

    async fn run_with(
        runner: Arc<dyn BulkContributionRunner>,
        summaries: Option<TaskSummary>,
    ) -> CalculationTask {
        let store = Arc::new(InMemoryStore::new());
        let task = store
            .create_task(CalculationTask::new_pending("user_1", "Foshan", 2025, None, 2))
            .await
            .unwrap();

        let executor = TaskExecutor::new(store.clone(), runner, Arc::new(FixedSummary(summaries)));
        executor.execute(CalculationJob::for_task(&task)).await;

        store.get_task(task.id, "user_1").await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_success_completes_with_summary() {
        let task = run_with(Arc::new(FixedRunner(Some(outcome(true, 2, 0)))), Some(summary())).await;

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.processed_employees, 2);
        assert_eq!(task.summary, Some(summary()));
        assert!(task.error_message.is_none());
        assert!(task.started_at.is_some());
        assert!(task.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_partial_failure_completes_with_note() {
        let task = run_with(Arc::new(FixedRunner(Some(outcome(true, 1, 1)))), Some(summary())).await;

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.processed_employees, 1);
        assert_eq!(
            task.error_message.as_deref(),
            Some("Calculation completed, but 1 records failed")
        );
    }

    #[tokio::test]
    async fn test_unsuccessful_outcome_fails_with_its_message() {
        let task = run_with(Arc::new(FixedRunner(Some(outcome(false, 0, 0)))), Some(summary())).await;

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error_message.as_deref(), Some("rate table missing"));
        assert!(task.completed_at.is_some());
        assert!(task.summary.is_none());
    }

    #[tokio::test]
    async fn test_missing_outcome_fails() {
        let task = run_with(Arc::new(FixedRunner(None)), Some(summary())).await;

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(
            task.error_message.as_deref(),
            Some("Bulk contribution run returned no outcome")
        );
    }

    #[tokio::test]
    async fn test_runner_error_fails() {
        let task = run_with(Arc::new(ErroringRunner), Some(summary())).await;

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error_message.as_deref(), Some("database connection lost"));
    }

    #[tokio::test]
    async fn test_missing_summary_fails() {
        let task = run_with(Arc::new(FixedRunner(Some(outcome(true, 2, 0)))), None).await;

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(
            task.error_message.as_deref(),
            Some("Calculation summary is unavailable")
        );
    }

    #[tokio::test]
    async fn test_task_cancelled_before_pickup_is_skipped() {
        let store = Arc::new(InMemoryStore::new());
        let task = store
            .create_task(CalculationTask::new_pending("user_1", "Foshan", 2025, None, 2))
            .await
            .unwrap();
        store
            .update_task(task.id, "user_1", TaskPatch::cancelled(Utc::now()))
            .await
            .unwrap();

        let executor = TaskExecutor::new(
            store.clone(),
            Arc::new(FixedRunner(Some(outcome(true, 2, 0)))),
            Arc::new(FixedSummary(Some(summary()))),
        );
        executor.execute(CalculationJob::for_task(&task)).await;

        let task = store.get_task(task.id, "user_1").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
        assert!(task.started_at.is_none());
        assert!(task.summary.is_none());
    }

    #[tokio::test]
    async fn test_missing_task_is_absorbed() {
        let store = Arc::new(InMemoryStore::new());
        let executor = TaskExecutor::new(
            store.clone(),
            Arc::new(FixedRunner(Some(outcome(true, 0, 0)))),
            Arc::new(FixedSummary(None)),
        );

        let job = CalculationJob {
            task_id: Uuid::new_v4(),
            owner: "user_1".to_string(),
            city: "Foshan".to_string(),
            year: 2025,
        };
        // Must return normally even though every store write fails.
        executor.execute(job).await;
        assert_eq!(store.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_queue_runs_submitted_jobs() {
        let store = Arc::new(InMemoryStore::new());
        let task = store
            .create_task(CalculationTask::new_pending("user_1", "Foshan", 2025, None, 2))
            .await
            .unwrap();
        let executor = TaskExecutor::new(
            store.clone(),
            Arc::new(FixedRunner(Some(outcome(true, 2, 0)))),
            Arc::new(FixedSummary(Some(summary()))),
        );

        let (queue, dispatcher) = JobQueue::start(executor);
        queue.submit(CalculationJob::for_task(&task)).unwrap();

        let status = wait_for_status(&store, task.id, TaskStatus::is_terminal).await;
        assert_eq!(status, TaskStatus::Completed);

        drop(queue);
        dispatcher.await.unwrap();
    }

    #[tokio::test]
    async fn test_panicking_job_is_marked_failed() {
        let store = Arc::new(InMemoryStore::new());
        let task = store
            .create_task(CalculationTask::new_pending("user_1", "Foshan", 2025, None, 2))
            .await
            .unwrap();
        let executor = TaskExecutor::new(
            store.clone(),
            Arc::new(PanickingRunner),
            Arc::new(FixedSummary(Some(summary()))),
        );

        let (queue, _dispatcher) = JobQueue::start(executor);
        queue.submit(CalculationJob::for_task(&task)).unwrap();

        let status = wait_for_status(&store, task.id, TaskStatus::is_terminal).await;
        assert_eq!(status, TaskStatus::Failed);

        let task = store.get_task(task.id, "user_1").await.unwrap().unwrap();
        assert_eq!(
            task.error_message.as_deref(),
            Some("Calculation worker panicked")
        );
        assert!(task.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_completion_overwrites_cancel_during_run() {
        let store = Arc::new(InMemoryStore::new());
        let task = store
            .create_task(CalculationTask::new_pending("user_1", "Foshan", 2025, None, 2))
            .await
            .unwrap();
        let gate = Arc::new(Notify::new());
        let executor = TaskExecutor::new(
            store.clone(),
            Arc::new(GatedRunner(gate.clone())),
            Arc::new(FixedSummary(Some(summary()))),
        );

        let job = CalculationJob::for_task(&task);
        let running = tokio::spawn(async move { executor.execute(job).await });

        let status = wait_for_status(&store, task.id, |s| s == TaskStatus::Processing).await;
        assert_eq!(status, TaskStatus::Processing);

        store
            .update_task(task.id, "user_1", TaskPatch::cancelled(Utc::now()))
            .await
            .unwrap();
        gate.notify_one();
        running.await.unwrap();

        let task = store.get_task(task.id, "user_1").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.summary, Some(summary()));
        assert!(task.error_message.is_none());
    }

    #[tokio::test]
    async fn test_submit_fails_once_dispatcher_is_gone() {
        let store = Arc::new(InMemoryStore::new());
        let executor = TaskExecutor::new(
            store.clone(),
            Arc::new(FixedRunner(None)),
            Arc::new(FixedSummary(None)),
        );

        let (queue, dispatcher) = JobQueue::start(executor);
        dispatcher.abort();
        let _ = dispatcher.await;

        let job = CalculationJob {
            task_id: Uuid::new_v4(),
            owner: "user_1".to_string(),
            city: "Foshan".to_string(),
            year: 2025,
        };
        assert!(matches!(queue.submit(job), Err(EngineError::Internal { .. })));
    }
}
