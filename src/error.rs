//! Error types for the Contribution Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while calculating contributions
//! and managing calculation tasks.

use thiserror::Error;

/// The main error type for the Contribution Engine.
///
/// Every fallible operation in the engine returns this error type. The
/// variants follow the taxonomy the HTTP layer exposes: request validation,
/// missing resources, business-rule rejections, conflicts and internal
/// failures, plus configuration loading errors.
///
/// # Example
///
/// ```
/// use contribution_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/server.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/server.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A rate table violated one of its invariants.
    #[error("Invalid rate table for {city} {year}: {message}")]
    InvalidRateTable {
        /// The city of the offending table.
        city: String,
        /// The year of the offending table.
        year: i32,
        /// What was wrong with it.
        message: String,
    },

    /// A request parameter was malformed or out of range.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// A description of the problem.
        message: String,
    },

    /// A required resource does not exist.
    #[error("{resource} not found")]
    NotFound {
        /// A description of the missing resource.
        resource: String,
    },

    /// A business rule rejected the operation.
    #[error("{message}")]
    Business {
        /// A description of the rejected rule.
        message: String,
    },

    /// The operation conflicts with existing state.
    #[error("{message}")]
    Conflict {
        /// A description of the conflict.
        message: String,
    },

    /// A contribution amount could not be represented.
    #[error("Calculation failed: {message}")]
    Calculation {
        /// What went wrong.
        message: String,
    },

    /// An unexpected failure, including failures reported by collaborators.
    #[error("{message}")]
    Internal {
        /// A description of the failure.
        message: String,
    },
}

impl EngineError {
    /// Creates a validation error for `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a not-found error for `resource`.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a business-rule error.
    pub fn business(message: impl Into<String>) -> Self {
        Self::Business {
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a calculation error.
    pub fn calculation(message: impl Into<String>) -> Self {
        Self::Calculation {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
