//! Response types for the Contribution Engine API.
//!
//! This module defines the JSON response bodies, the error response
//! structure, and the mapping from [`EngineError`] to HTTP errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculation::progress;
use crate::error::EngineError;
use crate::models::{CalculationTask, TaskStatus};
use crate::orchestrator::TaskAccepted;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response with the given code.
    pub fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(code, message),
        }
    }

    /// The response for requests that carry no owner identity.
    pub fn unauthenticated() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: ApiError::with_details(
                "UNAUTHENTICATED",
                "Missing owner identity",
                "Requests must carry an X-Owner-Id header",
            ),
        }
    }

    /// The response for task ids that do not resolve to a task.
    pub fn task_not_found() -> Self {
        EngineError::not_found("Task").into()
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::ConfigNotFound { path } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration error",
                    format!("Configuration file not found: {}", path),
                ),
            },
            EngineError::ConfigParseError { path, message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration parse error",
                    format!("Failed to parse {}: {}", path, message),
                ),
            },
            EngineError::InvalidRateTable {
                city,
                year,
                message,
            } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    format!("Invalid rate table for {} {}", city, year),
                    message,
                ),
            },
            err @ EngineError::Validation { .. } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::validation_error(err.to_string()),
            },
            err @ EngineError::NotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("NOT_FOUND", err.to_string()),
            },
            EngineError::Business { message } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::new("BUSINESS_ERROR", message),
            },
            EngineError::Conflict { message } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("CONFLICT", message),
            },
            err @ EngineError::Calculation { .. } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::new("CALCULATION_ERROR", err.to_string()),
            },
            EngineError::Internal { message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details("INTERNAL_ERROR", "Internal server error", message),
            },
        }
    }
}

/// Body of a `201 Created` reply to `POST /calculate/batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAcceptedResponse {
    /// The new task's id.
    pub task_id: Uuid,
    /// The new task's display name.
    pub task_name: String,
    /// Always `pending` on acceptance.
    pub status: TaskStatus,
    /// Distinct employees the task will process.
    pub total_employees: u32,
    /// The city whose rates apply.
    pub city: String,
    /// The calculation year.
    pub year: i32,
    /// A human-readable confirmation.
    pub message: String,
}

impl From<TaskAccepted> for BatchAcceptedResponse {
    fn from(accepted: TaskAccepted) -> Self {
        Self {
            task_id: accepted.task_id,
            task_name: accepted.task_name,
            status: TaskStatus::Pending,
            total_employees: accepted.total_employees,
            city: accepted.city,
            year: accepted.year,
            message: format!(
                "Calculation task created, {} employees queued",
                accepted.total_employees
            ),
        }
    }
}

/// A task record together with its completion percentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    /// The stored task.
    #[serde(flatten)]
    pub task: CalculationTask,
    /// `processed_employees` as a percentage of `total_employees`.
    pub progress_percentage: u8,
}

impl From<CalculationTask> for TaskView {
    fn from(task: CalculationTask) -> Self {
        let progress_percentage = progress(task.processed_employees, task.total_employees);
        Self {
            task,
            progress_percentage,
        }
    }
}

/// One page of an owner's tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListResponse {
    /// The tasks on this page, newest first.
    pub tasks: Vec<TaskView>,
    /// Tasks matching the filter across all pages.
    pub total: usize,
    /// Whether another page follows.
    pub has_more: bool,
}
