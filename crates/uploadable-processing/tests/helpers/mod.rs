//! Shared fixtures: a web root with a `media/` directory, an upload temp
//! directory, and validators wired to both.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uploadable_core::{BatchMode, PolicySet, UploaderConfig};
use uploadable_processing::UploadValidator;

pub const PNG_BYTES: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R',
];
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n";

pub struct TestEnv {
    pub web_root: TempDir,
    pub upload_dir: TempDir,
}

impl TestEnv {
    /// Web root with a writable `media/` directory
    pub async fn new() -> Self {
        let env = Self::without_media().await;
        tokio::fs::create_dir(env.web_root.path().join("media"))
            .await
            .unwrap();
        env
    }

    pub async fn without_media() -> Self {
        Self {
            web_root: tempfile::tempdir().unwrap(),
            upload_dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Write a file into the upload temp directory, as a multipart layer would
    pub async fn temp_upload(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.upload_dir.path().join(name);
        tokio::fs::write(&path, data).await.unwrap();
        path
    }

    pub fn config(&self, policies: PolicySet) -> UploaderConfig {
        UploaderConfig {
            web_root: self.web_root.path().to_path_buf(),
            upload_tmp_dir: self.upload_dir.path().to_path_buf(),
            batch_mode: BatchMode::FailFast,
            content_sniffing: false,
            policies,
        }
    }

    pub fn validator(&self, policies: PolicySet) -> UploadValidator {
        UploadValidator::from_config(&self.config(policies))
    }

    /// Filesystem location of an accepted upload's web path
    pub fn stored(&self, final_relative_path: &str) -> PathBuf {
        self.web_root
            .path()
            .join(final_relative_path.trim_start_matches('/'))
    }
}

/// Token part of a stored filename such as `upload_my-photo_<token>.png`
pub fn token_of(final_relative_path: &str) -> &str {
    let file = Path::new(final_relative_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap();
    file.rsplit('_').next().unwrap()
}
