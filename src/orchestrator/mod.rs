//! Calculation task orchestration.
//!
//! - [`TaskOrchestrator`]: accepts, queries, cancels and deletes tasks
//! - [`TaskExecutor`] and [`JobQueue`]: run accepted tasks in the background
//! - [`BatchPipeline`]: computes and stores every employee's result for a task

mod manager;
mod pipeline;
mod worker;

pub use manager::{
    Collaborators, CreateTaskParams, MAX_YEAR, MIN_YEAR, TaskAccepted, TaskOrchestrator,
    TaskProgress,
};
pub use pipeline::BatchPipeline;
pub use worker::{JobQueue, TaskExecutor};
