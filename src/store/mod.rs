//! Storage collaborators for the Contribution Engine.
//!
//! This module defines the traits the orchestrator consumes and an
//! in-memory implementation of the storage-backed ones.

mod memory;
mod traits;

pub use memory::InMemoryStore;
pub use traits::{
    BulkContributionRunner, RateTableProvider, ResultStore, SalaryRepository, SummaryReader,
    TaskStore,
};
