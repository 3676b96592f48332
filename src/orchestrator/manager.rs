//! The task orchestrator.
//!
//! [`TaskOrchestrator`] is the entry point for every outward operation on
//! calculation tasks. Creating a task runs the synchronous checks, persists
//! a `pending` record and hands the job to the background worker; every
//! other operation reads or transitions an existing record.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{distinct_employee_count, progress, status_message};
use crate::error::{EngineError, EngineResult};
use crate::models::{CalculationJob, CalculationTask, TaskPatch, TaskStatus};
use crate::store::{
    BulkContributionRunner, InMemoryStore, RateTableProvider, SalaryRepository, SummaryReader,
    TaskStore,
};

use super::pipeline::BatchPipeline;
use super::worker::{JobQueue, TaskExecutor};

/// Earliest accepted calculation year.
pub const MIN_YEAR: i32 = 2000;

/// Latest accepted calculation year.
pub const MAX_YEAR: i32 = 2100;

/// The collaborators an orchestrator works through.
#[derive(Clone)]
pub struct Collaborators {
    /// Rate table lookup.
    pub rate_tables: Arc<dyn RateTableProvider>,
    /// Imported salary data.
    pub salaries: Arc<dyn SalaryRepository>,
    /// Task records.
    pub tasks: Arc<dyn TaskStore>,
    /// Runs the per-employee calculation for a job.
    pub bulk: Arc<dyn BulkContributionRunner>,
    /// Reads back the aggregate of a finished run.
    pub summaries: Arc<dyn SummaryReader>,
}

impl Collaborators {
    /// Wires every collaborator to one in-memory store, with a
    /// [`BatchPipeline`] as the bulk runner.
    pub fn in_memory(rate_tables: Arc<dyn RateTableProvider>, store: Arc<InMemoryStore>) -> Self {
        let bulk = BatchPipeline::new(
            rate_tables.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        );
        Self {
            rate_tables,
            salaries: store.clone(),
            tasks: store.clone(),
            bulk: Arc::new(bulk),
            summaries: store,
        }
    }
}

/// Parameters for a new calculation task. Unset fields take defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateTaskParams {
    /// The city; defaults to the orchestrator's default city.
    pub city: Option<String>,
    /// The calculation year; defaults to the current year.
    pub year: Option<i32>,
    /// The upload the salary data came from.
    pub upload_ref: Option<String>,
}

/// What `create_and_start` reports back once the task is accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskAccepted {
    /// The new task's id.
    pub task_id: Uuid,
    /// The new task's display name.
    pub task_name: String,
    /// Distinct employees with salary records for the year.
    pub total_employees: u32,
    /// The resolved city.
    pub city: String,
    /// The resolved year.
    pub year: i32,
}

/// A progress snapshot for pollers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskProgress {
    /// The task polled.
    pub task_id: Uuid,
    /// Its current status.
    pub status: TaskStatus,
    /// Completion in `0..=100`.
    pub progress_percentage: u8,
    /// Employees processed so far.
    pub processed: u32,
    /// Employees to process.
    pub total: u32,
    /// A short phrase describing the status.
    pub message: String,
}

impl TaskProgress {
    /// Builds the snapshot for `task`.
    pub fn of(task: &CalculationTask) -> Self {
        let pct = progress(task.processed_employees, task.total_employees);
        Self {
            task_id: task.id,
            status: task.status,
            progress_percentage: pct,
            processed: task.processed_employees,
            total: task.total_employees,
            message: status_message(task.status, pct),
        }
    }
}

struct Inner {
    collaborators: Collaborators,
    executor: TaskExecutor,
    queue: JobQueue,
    default_city: String,
}

/// Accepts, tracks and transitions calculation tasks.
///
/// Cloning is cheap; clones share the same worker.
#[derive(Clone)]
pub struct TaskOrchestrator {
    inner: Arc<Inner>,
}

impl TaskOrchestrator {
    /// Starts the background worker and returns the orchestrator feeding it.
    ///
    /// Must be called from within a `tokio` runtime.
    pub fn start(collaborators: Collaborators, default_city: impl Into<String>) -> Self {
        let executor = TaskExecutor::new(
            collaborators.tasks.clone(),
            collaborators.bulk.clone(),
            collaborators.summaries.clone(),
        );
        let (queue, _dispatcher) = JobQueue::start(executor.clone());

        Self {
            inner: Arc::new(Inner {
                collaborators,
                executor,
                queue,
                default_city: default_city.into(),
            }),
        }
    }

    /// Returns the city used when a request names none.
    pub fn default_city(&self) -> &str {
        &self.inner.default_city
    }

    /// Validates the request, persists a pending task and schedules it.
    ///
    /// Returns as soon as the task row exists. Errors raised here leave no
    /// task behind:
    ///
    /// - `Validation` when the year is outside [`MIN_YEAR`]..=[`MAX_YEAR`]
    /// - `NotFound` when the city publishes no rate table for the year
    /// - `Conflict` when the owner already has a pending or processing task
    /// - `Business` when the owner has no salary records for the year
    ///
    /// The conflict check and the insert are not atomic, so two concurrent
    /// requests from one owner can both pass it.
    pub async fn create_and_start(
        &self,
        owner: &str,
        params: CreateTaskParams,
    ) -> EngineResult<TaskAccepted> {
        let c = &self.inner.collaborators;
        let city = params
            .city
            .filter(|city| !city.trim().is_empty())
            .unwrap_or_else(|| self.inner.default_city.clone());
        let year = params.year.unwrap_or_else(|| Utc::now().year());

        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(EngineError::validation(
                "year",
                format!("must be between {} and {}", MIN_YEAR, MAX_YEAR),
            ));
        }

        if c.rate_tables.rate_table(year, &city).await?.is_none() {
            return Err(EngineError::not_found(format!(
                "Rate table for {} {}",
                city, year
            )));
        }

        let active = c
            .tasks
            .list_tasks(owner, None)
            .await?
            .into_iter()
            .find(|task| !task.status.is_terminal());
        if let Some(active) = active {
            warn!(owner, task_id = %active.id, "Rejected task while another is active");
            return Err(EngineError::conflict(format!(
                "Task {} is still {}",
                active.id, active.status
            )));
        }

        let records = c.salaries.salaries_for_year(owner, year).await?;
        if records.is_empty() {
            return Err(EngineError::business(format!(
                "No salary records found for {}",
                year
            )));
        }
        let total_employees = u32::try_from(distinct_employee_count(&records))
            .map_err(|_| EngineError::business("Too many employees in one calculation"))?;

        let task = c
            .tasks
            .create_task(CalculationTask::new_pending(
                owner,
                city,
                year,
                params.upload_ref,
                total_employees,
            ))
            .await?;

        info!(
            owner,
            task_id = %task.id,
            city = %task.city,
            year = task.year,
            total_employees,
            "Calculation task accepted"
        );

        let job = CalculationJob::for_task(&task);
        if let Err(err) = self.inner.queue.submit(job.clone()) {
            self.inner.executor.record_failure(&job, &err).await;
        }

        Ok(TaskAccepted {
            task_id: task.id,
            task_name: task.task_name,
            total_employees,
            city: task.city,
            year: task.year,
        })
    }

    /// Returns the task, or `NotFound` if it does not exist for `owner`.
    pub async fn get_task(&self, task_id: Uuid, owner: &str) -> EngineResult<CalculationTask> {
        self.inner
            .collaborators
            .tasks
            .get_task(task_id, owner)
            .await?
            .ok_or_else(|| EngineError::not_found("Task"))
    }

    /// Returns `owner`'s tasks, newest first.
    pub async fn list_tasks(
        &self,
        owner: &str,
        status: Option<TaskStatus>,
    ) -> EngineResult<Vec<CalculationTask>> {
        self.inner.collaborators.tasks.list_tasks(owner, status).await
    }

    /// Returns the current progress of a task.
    pub async fn poll_progress(&self, task_id: Uuid, owner: &str) -> EngineResult<TaskProgress> {
        let task = self.get_task(task_id, owner).await?;
        Ok(TaskProgress::of(&task))
    }

    /// Cancels a pending or processing task.
    ///
    /// Work already running is not interrupted.
    pub async fn cancel(&self, task_id: Uuid, owner: &str) -> EngineResult<CalculationTask> {
        let task = self.get_task(task_id, owner).await?;
        if !task.status.can_cancel() {
            return Err(EngineError::business(format!(
                "Task cannot be cancelled while {}",
                task.status
            )));
        }

        let task = self
            .inner
            .collaborators
            .tasks
            .update_task(task_id, owner, TaskPatch::cancelled(Utc::now()))
            .await?;
        info!(owner, task_id = %task_id, "Calculation task cancelled");
        Ok(task)
    }

    /// Deletes a completed, failed or cancelled task.
    pub async fn delete(&self, task_id: Uuid, owner: &str) -> EngineResult<()> {
        let task = self.get_task(task_id, owner).await?;
        if !task.status.can_delete() {
            return Err(EngineError::business(format!(
                "Task cannot be deleted while {}",
                task.status
            )));
        }

        if !self.inner.collaborators.tasks.delete_task(task_id, owner).await? {
            return Err(EngineError::not_found("Task"));
        }
        info!(owner, task_id = %task_id, "Calculation task deleted");
        Ok(())
    }
}
