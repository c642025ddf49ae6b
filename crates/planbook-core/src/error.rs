//! Core error types for planbook-core.
//!
//! Every fallible operation in the library reports one of the variants
//! below. The first four mirror the domain taxonomy (missing documents or
//! ids, a full feedback queue, rejected state transitions, unreadable
//! documents); the rest wrap the plumbing underneath.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for planbook-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A document or identifier does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A bounded collection is full.
    #[error("{what} is full (limit: {limit})")]
    CapacityExceeded { what: &'static str, limit: usize },

    /// The requested transition is not allowed from the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A persisted document could not be decoded.
    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// SQLite errors from the document table
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// The data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Progress outside 0..=100
    #[error("Progress must be between 0 and 100, got {0}")]
    ProgressOutOfRange(u32),

    /// Malformed positional task path
    #[error("Invalid task path '{0}'")]
    InvalidTaskPath(String),

    /// Malformed goal identifier
    #[error("Invalid goal id '{0}'")]
    InvalidGoalId(String),

    /// Empty value where text is required
    #[error("Empty value for '{0}'")]
    Empty(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
