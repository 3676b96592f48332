//! Core data models for the Contribution Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod contribution_result;
mod rate_table;
mod salary;
mod task;

pub use contribution_result::{ContributionAmounts, ContributionResult};
pub use rate_table::{CategoryRate, RateTable};
pub use salary::{SalaryAmount, SalaryRecord};
pub use task::{
    BatchOutcome, CalculationJob, CalculationTask, TaskPatch, TaskStatus, TaskSummary, task_name,
};
