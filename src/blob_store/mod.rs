//! Blob storage for uploaded artwork images.
//!
//! Uploads are append-only: every stored image gets a fresh generated name,
//! never overwriting an existing file.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persists uploaded image bytes and returns a stable public reference.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under a freshly generated name derived from
    /// `original_filename`'s extension; returns the public reference.
    async fn put_image(&self, original_filename: &str, data: &[u8])
        -> Result<String, BlobStoreError>;
}

/// Local-filesystem blob store serving files under `/paintings/<name>`.
pub struct FsBlobStore {
    media_dir: PathBuf,
}

impl FsBlobStore {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: media_dir.into(),
        }
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Initialize the blob store (creates the media directory).
    pub async fn init(&self) -> Result<(), BlobStoreError> {
        fs::create_dir_all(&self.media_dir).await?;
        Ok(())
    }
}

fn upload_name(original_filename: &str) -> String {
    let ext = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_else(|| ".png".to_string());
    format!("upload-{}{}", Utc::now().timestamp_millis(), ext)
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put_image(
        &self,
        original_filename: &str,
        data: &[u8],
    ) -> Result<String, BlobStoreError> {
        fs::create_dir_all(&self.media_dir).await?;

        let name = upload_name(original_filename);
        let file_path = self.media_dir.join(&name);

        let mut file = fs::File::create(&file_path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        debug!("Stored uploaded image at {:?}", file_path);
        Ok(format!("/paintings/{}", name))
    }
}
