//! Stock [`UploadProvenance`] implementations.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::traits::UploadProvenance;

/// Temp paths the host recorded while parsing the current request.
#[derive(Debug, Clone, Default)]
pub struct TrackedUploads {
    paths: HashSet<PathBuf>,
}

impl TrackedUploads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, temp_path: impl Into<PathBuf>) {
        self.paths.insert(temp_path.into());
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for TrackedUploads {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl UploadProvenance for TrackedUploads {
    async fn is_genuine_upload(&self, temp_path: &Path) -> bool {
        self.paths.contains(temp_path)
    }
}

/// Accepts regular files sitting directly inside the host's upload temp
/// directory.
///
/// Symlinks are refused, and so is anything in a subdirectory.
#[derive(Debug, Clone)]
pub struct UploadDirProvenance {
    upload_dir: PathBuf,
}

impl UploadDirProvenance {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }
}

#[async_trait]
impl UploadProvenance for UploadDirProvenance {
    async fn is_genuine_upload(&self, temp_path: &Path) -> bool {
        match fs::symlink_metadata(temp_path).await {
            Ok(meta) if meta.file_type().is_file() => {}
            _ => return false,
        }

        let (Ok(dir), Ok(file)) = (
            fs::canonicalize(&self.upload_dir).await,
            fs::canonicalize(temp_path).await,
        ) else {
            return false;
        };

        let genuine = file.parent() == Some(dir.as_path());
        if !genuine {
            tracing::debug!(
                path = %temp_path.display(),
                upload_dir = %self.upload_dir.display(),
                "Path is outside the upload temp directory"
            );
        }
        genuine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_tracked_uploads() {
        let tracked: TrackedUploads = ["/tmp/phpA1"].into_iter().collect();

        assert!(tracked.is_genuine_upload(Path::new("/tmp/phpA1")).await);
        assert!(!tracked.is_genuine_upload(Path::new("/etc/passwd")).await);
    }

    #[tokio::test]
    async fn test_upload_dir_accepts_direct_children() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("upload_1");
        fs::write(&file, b"x").await.unwrap();

        let provenance = UploadDirProvenance::new(dir.path());
        assert!(provenance.is_genuine_upload(&file).await);
    }

    #[tokio::test]
    async fn test_upload_dir_rejects_outside_and_nested() {
        let dir = tempdir().unwrap();
        let other = tempdir().unwrap();
        let outside = other.path().join("secret");
        fs::write(&outside, b"x").await.unwrap();
        fs::create_dir(dir.path().join("nested")).await.unwrap();
        let nested = dir.path().join("nested/file");
        fs::write(&nested, b"x").await.unwrap();

        let provenance = UploadDirProvenance::new(dir.path());
        assert!(!provenance.is_genuine_upload(&outside).await);
        assert!(!provenance.is_genuine_upload(&nested).await);
        assert!(!provenance.is_genuine_upload(&dir.path().join("missing")).await);
        assert!(!provenance.is_genuine_upload(&dir.path().join("nested")).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_upload_dir_rejects_symlinks() {
        let dir = tempdir().unwrap();
        let other = tempdir().unwrap();
        let target = other.path().join("secret");
        fs::write(&target, b"x").await.unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let provenance = UploadDirProvenance::new(dir.path());
        assert!(!provenance.is_genuine_upload(&link).await);
    }
}
