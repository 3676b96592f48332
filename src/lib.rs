//! Contribution Engine for social insurance and housing fund
//!
//! This crate calculates the monthly employer and employee contributions an
//! employee's salary attracts under a city's published rate table, and runs
//! those calculations for a whole salary import as tracked background tasks.
//!
//! - [`calculation`]: the pure contribution rules
//! - [`orchestrator`]: task acceptance, background execution and progress
//! - [`store`]: the storage collaborators and an in-memory backend
//! - [`config`]: YAML configuration and rate tables
//! - [`api`]: the HTTP surface

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod store;
