use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Local filesystem storage rooted at the web/document root
#[derive(Clone, Debug)]
pub struct LocalStorage {
    web_root: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `web_root` - Document root that keys resolve under (e.g., "/var/www/html")
    pub fn new(web_root: impl Into<PathBuf>) -> Self {
        LocalStorage {
            web_root: web_root.into(),
        }
    }

    pub fn web_root(&self) -> &Path {
        &self.web_root
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Rejects keys that could escape the web root: absolute keys, `..`
    /// components, and keys resolving through a symlink to somewhere outside.
    /// Dots inside a name (`media..v2`) are fine.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.starts_with('/') || key.contains('\\') {
            return Err(StorageError::InvalidKey(format!(
                "Storage key contains invalid characters: {}",
                key
            )));
        }

        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(StorageError::InvalidKey(format!(
                "Storage key is not a relative path: {}",
                key
            )));
        }

        let path = self.web_root.join(relative);

        // Only existing prefixes can be canonicalized; check the deepest one
        if let Ok(base_canonical) = self.web_root.canonicalize() {
            let mut existing = Some(path.as_path());
            while let Some(candidate) = existing {
                if let Ok(canonical) = candidate.canonicalize() {
                    if canonical.strip_prefix(&base_canonical).is_err() {
                        return Err(StorageError::InvalidKey(
                            "Storage key resolves outside web root".to_string(),
                        ));
                    }
                    break;
                }
                existing = candidate.parent();
            }
        }

        Ok(path)
    }

    /// Create a throwaway file to prove the directory accepts writes.
    async fn probe_write(dir: &Path) -> std::io::Result<()> {
        let probe = dir.join(format!(".uploadable-probe-{}", Uuid::new_v4().simple()));
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&probe)
            .await?;
        fs::remove_file(&probe).await
    }

    /// Copy `source` to a freshly created `dest`, then remove `source`.
    ///
    /// Used when linking is impossible, e.g. when the temp dir is on another
    /// device. A partial or unsynced `dest` is removed on failure.
    async fn copy_then_remove(source: &Path, dest: &Path) -> std::io::Result<()> {
        let mut reader = fs::File::open(source).await?;
        let mut writer = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .await?;

        let copied = async {
            tokio::io::copy(&mut reader, &mut writer).await?;
            writer.flush().await?;
            writer.sync_all().await
        }
        .await;
        drop(writer);

        if let Err(e) = copied {
            discard(dest).await;
            return Err(e);
        }

        Self::remove_source_or_discard(source, dest).await
    }

    /// Finish a move by removing `source`. If that fails the stored copy is
    /// removed again so a failed move leaves only the source behind.
    async fn remove_source_or_discard(source: &Path, dest: &Path) -> std::io::Result<()> {
        if let Err(e) = fs::remove_file(source).await {
            discard(dest).await;
            return Err(e);
        }
        Ok(())
    }
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "Failed to remove file left by an incomplete move"
        );
    }
}

fn move_failed(source: &Path, dest: &Path, e: std::io::Error) -> StorageError {
    StorageError::MoveFailed(format!(
        "Failed to move {} to {}: {}",
        source.display(),
        dest.display(),
        e
    ))
}

#[async_trait]
impl Storage for LocalStorage {
    async fn is_writable(&self, dir_key: &str) -> bool {
        let Ok(path) = self.key_to_path(dir_key) else {
            return false;
        };

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => {}
            _ => return false,
        }

        match Self::probe_write(&path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %e,
                    "Write probe failed"
                );
                false
            }
        }
    }

    async fn move_into(&self, source: &Path, dest_key: &str) -> StorageResult<()> {
        let dest = self.key_to_path(dest_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(source).await.unwrap_or(false) {
            return Err(StorageError::NotFound(source.display().to_string()));
        }

        // Linking and create_new both refuse an existing dest, so nothing is
        // ever replaced
        match fs::hard_link(source, &dest).await {
            Ok(()) => Self::remove_source_or_discard(source, &dest)
                .await
                .map_err(|e| move_failed(source, &dest, e))?,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(dest_key.to_string()));
            }
            Err(link_err) => {
                tracing::debug!(
                    source = %source.display(),
                    dest = %dest.display(),
                    error = %link_err,
                    "Hard link failed, falling back to copy"
                );

                Self::copy_then_remove(source, &dest)
                    .await
                    .map_err(|e| match e.kind() {
                        ErrorKind::AlreadyExists => {
                            StorageError::AlreadyExists(dest_key.to_string())
                        }
                        _ => move_failed(source, &dest, e),
                    })?;
            }
        }

        tracing::info!(
            source = %source.display(),
            path = %dest.display(),
            key = %dest_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage move successful"
        );

        Ok(())
    }
}
