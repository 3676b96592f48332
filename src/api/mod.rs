//! HTTP API module for the Contribution Engine.
//!
//! This module provides the REST endpoints for starting batch contribution
//! calculations and for tracking, cancelling and deleting the resulting
//! tasks.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::{create_router, OWNER_HEADER};
pub use request::{BatchCalculateRequest, ListTasksQuery};
pub use response::{ApiError, BatchAcceptedResponse, TaskListResponse, TaskView};
pub use state::AppState;
