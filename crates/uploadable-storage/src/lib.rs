//! Uploadable Storage Library
//!
//! This crate provides the destination side of an upload: a writability check
//! and a move primitive behind the [`Storage`] trait, plus [`LocalStorage`],
//! which places files under a web root on the local filesystem.
//!
//! # Key format
//!
//! Storage keys are web-root relative paths such as `media/upload_a_1f2e.png`.
//! Keys must not contain `..` or a leading `/`.

pub mod local;
pub mod traits;

// Re-export commonly used types
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
