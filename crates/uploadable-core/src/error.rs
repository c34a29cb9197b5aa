//! Error types module
//!
//! Configuration-time failures live here. Upload rejections are not errors:
//! they are returned as [`ValidationResult::Rejected`](crate::ValidationResult)
//! values so one bad file never aborts the process.

use std::io;
use std::path::PathBuf;

/// Log level for reporting a rejection or failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected failures like a disallowed file type
    Debug,
    /// Warning level - for misconfiguration operators should look at
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Errors raised while building a [`PolicySet`](crate::PolicySet).
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Invalid policy for '{field}': {message}")]
    InvalidEntry { field: String, message: String },

    #[error("Invalid destination path for '{field}': {path}")]
    InvalidPath { field: String, path: String },

    #[error("Policy document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read policy file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors raised while loading [`UploaderConfig`](crate::UploaderConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment configuration error: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}
