//! Uploadable Core Library
//!
//! This crate provides the domain types shared by every Uploadable component:
//! per-field upload policies, upload candidates and submitted form fields,
//! validation results, slug generation, error types and configuration.

pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod slug;

// Re-export commonly used types
pub use config::{BatchMode, UploaderConfig};
pub use error::{ConfigError, LogLevel, PolicyError};
pub use models::{FieldValue, FormFields, RejectionReason, UploadCandidate, ValidationResult};
pub use policy::{Policy, PolicySet, DEFAULT_POLICY_KEY};
pub use slug::slugify;
