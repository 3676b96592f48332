//! Application state for the Contribution Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use crate::orchestrator::TaskOrchestrator;

/// Shared application state.
///
/// Holds the task orchestrator, which itself shares its collaborators and
/// background worker across clones.
#[derive(Clone)]
pub struct AppState {
    orchestrator: TaskOrchestrator,
}

impl AppState {
    /// Creates a new application state around the orchestrator.
    pub fn new(orchestrator: TaskOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Returns the task orchestrator.
    pub fn orchestrator(&self) -> &TaskOrchestrator {
        &self.orchestrator
    }
}
