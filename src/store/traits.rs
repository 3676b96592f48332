//! Collaborator interfaces consumed by the orchestrator.
//!
//! Rate tables, salary data, task records and computed results live behind
//! these traits so the orchestrator never depends on a concrete storage
//! backend. All of them are object safe and meant to be held as
//! `Arc<dyn Trait>`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{
    BatchOutcome, CalculationJob, CalculationTask, ContributionResult, RateTable, SalaryRecord,
    TaskPatch, TaskStatus, TaskSummary,
};

/// Looks up the rate table a city publishes for a year.
#[async_trait]
pub trait RateTableProvider: Send + Sync {
    /// Returns the table for `(year, city)`, or `None` if none is published.
    async fn rate_table(&self, year: i32, city: &str) -> EngineResult<Option<RateTable>>;
}

/// Read access to imported salary data.
#[async_trait]
pub trait SalaryRepository: Send + Sync {
    /// Returns every salary record `owner` imported for `year`.
    async fn salaries_for_year(&self, owner: &str, year: i32) -> EngineResult<Vec<SalaryRecord>>;
}

/// Storage for calculation task records.
///
/// Every method except `create_task` is scoped by `(id, owner)`; a task
/// belonging to another owner behaves exactly like a missing one.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists a new task and returns it.
    async fn create_task(&self, task: CalculationTask) -> EngineResult<CalculationTask>;

    /// Applies `patch` and returns the updated task.
    ///
    /// Fails with `NotFound` when the task does not exist for `owner`.
    async fn update_task(
        &self,
        id: Uuid,
        owner: &str,
        patch: TaskPatch,
    ) -> EngineResult<CalculationTask>;

    /// Returns the task, if it exists for `owner`.
    async fn get_task(&self, id: Uuid, owner: &str) -> EngineResult<Option<CalculationTask>>;

    /// Returns `owner`'s tasks, newest first, optionally filtered by status.
    async fn list_tasks(
        &self,
        owner: &str,
        status: Option<TaskStatus>,
    ) -> EngineResult<Vec<CalculationTask>>;

    /// Removes the task. Returns false when it did not exist for `owner`.
    async fn delete_task(&self, id: Uuid, owner: &str) -> EngineResult<bool>;

    /// Atomically adds one to `processed_employees` and returns the new value.
    ///
    /// The counter saturates at `total_employees`.
    async fn increment_processed(&self, id: Uuid, owner: &str) -> EngineResult<u32>;
}

/// Storage for computed contribution results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Stores `result`, replacing any earlier result for the same
    /// (owner, year, employee).
    async fn save_result(&self, result: ContributionResult) -> EngineResult<()>;

    /// Returns `owner`'s results for `year`, ordered by employee id.
    async fn results_for_year(&self, owner: &str, year: i32)
    -> EngineResult<Vec<ContributionResult>>;
}

/// Aggregates stored results into a task summary.
#[async_trait]
pub trait SummaryReader: Send + Sync {
    /// Returns the summary for `(owner, year)`, or `None` when no results exist.
    async fn aggregate_summary(&self, owner: &str, year: i32) -> EngineResult<Option<TaskSummary>>;
}

/// Computes and persists contribution results for every employee of a job.
#[async_trait]
pub trait BulkContributionRunner: Send + Sync {
    /// Runs the calculation for `job`.
    ///
    /// `Ok(None)` means the runner produced no outcome at all, which the
    /// orchestrator treats as a failure.
    async fn run_batch(&self, job: &CalculationJob) -> EngineResult<Option<BatchOutcome>>;
}
