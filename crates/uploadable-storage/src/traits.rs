//! Storage abstraction trait
//!
//! This module defines the Storage trait that destination backends implement.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Move failed: {0}")]
    MoveFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Destination already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination filesystem for accepted uploads
///
/// Keys are relative to the backend's root (the web root for
/// [`LocalStorage`](crate::LocalStorage)). A directory key names a policy
/// destination such as `media`; a file key names the final stored file such as
/// `media/upload_photo_<token>.png`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Whether new files can be created inside the directory `dir_key`.
    ///
    /// A missing directory is not writable. Never creates the directory.
    async fn is_writable(&self, dir_key: &str) -> bool;

    /// Move the temporary file at `source` to `dest_key`.
    ///
    /// Never overwrites: fails with [`StorageError::AlreadyExists`] when the
    /// destination is taken. The source is gone after a successful move.
    /// A failed move leaves `source` in place and creates nothing at `dest_key`.
    async fn move_into(&self, source: &Path, dest_key: &str) -> StorageResult<()>;
}
