//! Calculation task model.
//!
//! This module defines [`CalculationTask`], the record that tracks one batch
//! calculation for one owner, its closed [`TaskStatus`] state machine, the
//! [`TaskPatch`] used to update it, and the [`TaskSummary`] written on
//! completion.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The lifecycle status of a calculation task.
///
/// ```text
/// pending ──► processing ──► completed
///    │            │      └──► failed
///    └────────────┴─────────► cancelled
/// ```
///
/// `Completed`, `Failed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepted, waiting for the worker to pick it up.
    Pending,
    /// The worker is computing contributions.
    Processing,
    /// Finished successfully, possibly with a partial-failure note.
    Completed,
    /// Finished with an error.
    Failed,
    /// Cancelled by the owner.
    Cancelled,
}

impl TaskStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::Processing,
        TaskStatus::Completed,
        TaskStatus::Failed,
        TaskStatus::Cancelled,
    ];

    /// Returns true for statuses no transition leaves.
    pub fn is_terminal(self) -> bool {
        match self {
            TaskStatus::Pending | TaskStatus::Processing => false,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled => true,
        }
    }

    /// Returns true when the owner may cancel a task in this status.
    pub fn can_cancel(self) -> bool {
        !self.is_terminal()
    }

    /// Returns true when the owner may delete a task in this status.
    pub fn can_delete(self) -> bool {
        self.is_terminal()
    }

    /// Returns the wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown task status '{}'", s))
    }
}

/// Aggregate figures for a finished calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Number of employees with a stored result.
    pub employee_count: u32,
    /// Sum of every employee's employer-side total.
    pub total_company_cost: Decimal,
    /// Sum of every employee's employee-side total.
    pub total_employee_cost: Decimal,
    /// `(total_company_cost + total_employee_cost) / employee_count`, in cents.
    pub avg_cost_per_employee: Decimal,
}

/// The outcome reported by a bulk contribution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Whether the run as a whole succeeded.
    pub success: bool,
    /// A human-readable description of the outcome.
    pub message: String,
    /// Employees whose result was computed and stored.
    pub processed_count: u32,
    /// Employees whose result could not be stored.
    pub error_count: u32,
}

/// The unit of work the background worker executes for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationJob {
    /// The task being executed.
    pub task_id: Uuid,
    /// The task's owner.
    pub owner: String,
    /// The city whose rate table is applied.
    pub city: String,
    /// The calculation year.
    pub year: i32,
}

impl CalculationJob {
    /// Builds the job for `task`.
    pub fn for_task(task: &CalculationTask) -> Self {
        Self {
            task_id: task.id,
            owner: task.owner.clone(),
            city: task.city.clone(),
            year: task.year,
        }
    }
}

/// A batch calculation tracked for one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationTask {
    /// The task identifier.
    pub id: Uuid,
    /// The owner who requested the calculation.
    pub owner: String,
    /// A display name such as "Foshan 2025 contribution calculation".
    pub task_name: String,
    /// The city whose rate table is applied.
    pub city: String,
    /// The calculation year.
    pub year: i32,
    /// The upload the salary data came from, if known.
    pub upload_ref: Option<String>,
    /// Distinct employees counted when the task was accepted.
    pub total_employees: u32,
    /// Employees processed so far.
    pub processed_employees: u32,
    /// The lifecycle status.
    pub status: TaskStatus,
    /// Failure reason, or a partial-failure note on completed tasks.
    pub error_message: Option<String>,
    /// Aggregate figures, present once completed.
    pub summary: Option<TaskSummary>,
    /// When the task was accepted.
    pub created_at: DateTime<Utc>,
    /// When the worker started it.
    pub started_at: Option<DateTime<Utc>>,
    /// When it reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

impl CalculationTask {
    /// Creates a pending task with nothing processed yet.
    pub fn new_pending(
        owner: impl Into<String>,
        city: impl Into<String>,
        year: i32,
        upload_ref: Option<String>,
        total_employees: u32,
    ) -> Self {
        let city = city.into();
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            task_name: task_name(&city, year),
            city,
            year,
            upload_ref,
            total_employees,
            processed_employees: 0,
            status: TaskStatus::Pending,
            error_message: None,
            summary: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Applies every field `patch` sets.
    ///
    /// `processed_employees` never exceeds `total_employees`.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(processed) = patch.processed_employees {
            self.processed_employees = processed.min(self.total_employees);
        }
        if let Some(message) = patch.error_message {
            self.error_message = Some(message);
        }
        if let Some(summary) = patch.summary {
            self.summary = Some(summary);
        }
        if let Some(started_at) = patch.started_at {
            self.started_at = Some(started_at);
        }
        if let Some(completed_at) = patch.completed_at {
            self.completed_at = Some(completed_at);
        }
    }
}

/// Builds the display name of a task.
pub fn task_name(city: &str, year: i32) -> String {
    format!("{} {} contribution calculation", city, year)
}

/// A partial update to a [`CalculationTask`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    /// New status.
    pub status: Option<TaskStatus>,
    /// New processed count.
    pub processed_employees: Option<u32>,
    /// New error message.
    pub error_message: Option<String>,
    /// New summary.
    pub summary: Option<TaskSummary>,
    /// New start time.
    pub started_at: Option<DateTime<Utc>>,
    /// New completion time.
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskPatch {
    /// A patch moving the task to `processing` with the counter reset.
    pub fn started(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(TaskStatus::Processing),
            processed_employees: Some(0),
            started_at: Some(at),
            ..Self::default()
        }
    }

    /// A patch completing the task.
    pub fn completed(
        processed: u32,
        summary: TaskSummary,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: Some(TaskStatus::Completed),
            processed_employees: Some(processed),
            error_message: note,
            summary: Some(summary),
            completed_at: Some(at),
            ..Self::default()
        }
    }

    /// A patch failing the task. The processed count is left as last stored.
    pub fn failed(message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(TaskStatus::Failed),
            error_message: Some(message.into()),
            completed_at: Some(at),
            ..Self::default()
        }
    }

    /// A patch cancelling the task.
    pub fn cancelled(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(TaskStatus::Cancelled),
            completed_at: Some(at),
            ..Self::default()
        }
    }
}
