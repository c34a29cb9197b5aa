//! Magic-byte content sniffing backed by the `infer` crate.

use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncReadExt;

use super::traits::ContentSniffer;

/// Bytes read from the start of a file; enough for every `infer` matcher.
const SNIFF_LEN: usize = 8192;

#[derive(Debug, Clone, Copy, Default)]
pub struct MagicByteSniffer;

#[async_trait]
impl ContentSniffer for MagicByteSniffer {
    async fn sniff(&self, path: &Path) -> std::io::Result<Option<String>> {
        let file = tokio::fs::File::open(path).await?;
        let mut head = Vec::with_capacity(SNIFF_LEN);
        file.take(SNIFF_LEN as u64).read_to_end(&mut head).await?;

        Ok(infer::get(&head).map(|kind| kind.mime_type().to_string()))
    }
}
