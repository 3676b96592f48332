//! Configuration loading and management for the Contribution Engine.
//!
//! This module loads server settings, city rate tables and optional salary
//! seed data from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use contribution_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config").unwrap();
//! println!("Default city: {}", config.settings().default_city);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{SalarySeed, ServerSettings};
