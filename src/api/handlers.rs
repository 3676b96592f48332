//! HTTP request handlers for the Contribution Engine API.
//!
//! This module contains the handler functions for all API endpoints. Every
//! endpoint is scoped to the owner named by the `X-Owner-Id` header.

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::TaskStatus;

use super::request::{BatchCalculateRequest, ListTasksQuery};
use super::response::{
    ApiError, ApiErrorResponse, BatchAcceptedResponse, TaskListResponse, TaskView,
};
use super::state::AppState;

/// Header carrying the caller's owner id.
pub const OWNER_HEADER: &str = "x-owner-id";

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/calculate/batch", post(create_batch_handler))
        .route("/calculate/tasks", get(list_tasks_handler))
        .route(
            "/calculate/tasks/:task_id",
            get(get_task_handler).delete(delete_task_handler),
        )
        .route("/calculate/tasks/:task_id/cancel", post(cancel_task_handler))
        .route("/calculate/progress/:task_id", get(progress_handler))
        .with_state(state)
}

/// Extracts the owner id from the request headers.
fn owner_from(headers: &HeaderMap) -> Result<String, ApiErrorResponse> {
    headers
        .get(OWNER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|owner| !owner.is_empty())
        .map(str::to_string)
        .ok_or_else(ApiErrorResponse::unauthenticated)
}

/// Parses a task id path segment. Unparsable ids cannot name a task.
fn parse_task_id(raw: &str) -> Result<Uuid, ApiErrorResponse> {
    Uuid::parse_str(raw).map_err(|_| ApiErrorResponse::task_not_found())
}

/// Maps a JSON extraction failure to an API error.
fn json_rejection_error(correlation_id: Uuid, rejection: JsonRejection) -> ApiErrorResponse {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            ApiError::validation_error(body_text)
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };

    ApiErrorResponse {
        status: StatusCode::BAD_REQUEST,
        error,
    }
}

/// Validated pagination and filter for the task list.
struct ListParams {
    status: Option<TaskStatus>,
    limit: usize,
    offset: usize,
}

impl ListParams {
    fn parse(query: ListTasksQuery) -> Result<Self, ApiErrorResponse> {
        let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse::<TaskStatus>().map_err(|_| {
                ApiErrorResponse::bad_request(
                    "INVALID_STATUS",
                    format!("status must be one of: {}", status_names()),
                )
            })?),
            None => None,
        };

        let limit = match query.limit.as_deref() {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|limit| (1..=MAX_LIMIT).contains(limit))
                .ok_or_else(|| {
                    ApiErrorResponse::bad_request(
                        "INVALID_LIMIT",
                        format!("limit must be between 1 and {}", MAX_LIMIT),
                    )
                })?,
            None => DEFAULT_LIMIT,
        };

        let offset = match query.offset.as_deref() {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                ApiErrorResponse::bad_request("INVALID_OFFSET", "offset must be 0 or greater")
            })?,
            None => 0,
        };

        Ok(Self {
            status,
            limit,
            offset,
        })
    }
}

fn status_names() -> String {
    TaskStatus::ALL
        .iter()
        .map(|status| status.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Handler for POST /calculate/batch.
///
/// Accepts a batch calculation and returns `201 Created` once the task is
/// queued. The calculation itself runs in the background.
async fn create_batch_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<BatchCalculateRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing batch calculation request");

    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(err) => return err.into_response(),
    };

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_error(correlation_id, rejection).into_response(),
    };

    let start_time = Instant::now();
    match state
        .orchestrator()
        .create_and_start(&owner, request.into())
        .await
    {
        Ok(accepted) => {
            info!(
                correlation_id = %correlation_id,
                owner = %owner,
                task_id = %accepted.task_id,
                total_employees = accepted.total_employees,
                duration_us = start_time.elapsed().as_micros(),
                "Batch calculation accepted"
            );
            (
                StatusCode::CREATED,
                Json(BatchAcceptedResponse::from(accepted)),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                owner = %owner,
                error = %err,
                "Batch calculation rejected"
            );
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for GET /calculate/tasks.
async fn list_tasks_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<TaskListResponse>, ApiErrorResponse> {
    let owner = owner_from(&headers)?;
    let params = ListParams::parse(query)?;

    let tasks = state
        .orchestrator()
        .list_tasks(&owner, params.status)
        .await?;
    let total = tasks.len();

    let page: Vec<TaskView> = tasks
        .into_iter()
        .skip(params.offset)
        .take(params.limit)
        .map(TaskView::from)
        .collect();
    let has_more = params.offset.saturating_add(page.len()) < total;

    Ok(Json(TaskListResponse {
        tasks: page,
        total,
        has_more,
    }))
}

/// Handler for GET /calculate/tasks/:task_id.
async fn get_task_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> Result<Json<TaskView>, ApiErrorResponse> {
    let owner = owner_from(&headers)?;
    let task_id = parse_task_id(&task_id)?;

    let task = state.orchestrator().get_task(task_id, &owner).await?;
    Ok(Json(TaskView::from(task)))
}

/// Handler for POST /calculate/tasks/:task_id/cancel.
async fn cancel_task_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> Result<Json<TaskView>, ApiErrorResponse> {
    let owner = owner_from(&headers)?;
    let task_id = parse_task_id(&task_id)?;

    let task = state
        .orchestrator()
        .cancel(task_id, &owner)
        .await
        .inspect_err(|err| warn!(task_id = %task_id, error = %err, "Cancel rejected"))?;
    Ok(Json(TaskView::from(task)))
}

/// Handler for DELETE /calculate/tasks/:task_id.
async fn delete_task_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> Result<StatusCode, ApiErrorResponse> {
    let owner = owner_from(&headers)?;
    let task_id = parse_task_id(&task_id)?;

    state
        .orchestrator()
        .delete(task_id, &owner)
        .await
        .inspect_err(|err| warn!(task_id = %task_id, error = %err, "Delete rejected"))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /calculate/progress/:task_id.
async fn progress_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> Response {
    let owner = match owner_from(&headers) {
        Ok(owner) => owner,
        Err(err) => return err.into_response(),
    };
    let task_id = match parse_task_id(&task_id) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.orchestrator().poll_progress(task_id, &owner).await {
        Ok(progress) => Json(progress).into_response(),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}
