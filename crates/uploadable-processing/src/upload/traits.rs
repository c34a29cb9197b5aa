//! Traits for the upload validator's host collaborators.

use async_trait::async_trait;
use std::path::Path;

/// Confirms a temp path was produced by the host's upload handling.
///
/// Implemented by the host: only it knows which files its multipart layer
/// wrote for the current request. Paths that fail this check are never
/// treated as uploads, so a client cannot name an arbitrary server file.
#[async_trait]
pub trait UploadProvenance: Send + Sync {
    async fn is_genuine_upload(&self, temp_path: &Path) -> bool;
}

/// Identifies a file's type from its content.
#[async_trait]
pub trait ContentSniffer: Send + Sync {
    /// MIME type recognised from the file's leading bytes, `None` if unknown.
    async fn sniff(&self, path: &Path) -> std::io::Result<Option<String>>;
}
