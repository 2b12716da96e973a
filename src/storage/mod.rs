//! Blob storage backends for payloads and rendered publication files.

pub mod filesystem;

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

use crate::config::Config;
use crate::error::{AppError, Result};
use filesystem::FilesystemBlobStore;

/// Blob storage trait. Blob keys are logically partitioned per artefact id,
/// so concurrent operations across different artefacts never contend.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store content under the given key
    async fn put(&self, key: &str, content: Bytes) -> Result<()>;

    /// Retrieve content by key; `AppError::NotFound` when the blob is absent
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Check if a blob exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Delete a blob. Deleting an absent blob is a no-op.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Get blob size without fetching content; `None` when the blob is absent
    async fn size(&self, key: &str) -> Result<Option<u64>>;
}

/// Create the configured blob store backend.
pub async fn from_config(config: &Config) -> Result<Arc<dyn BlobStore>> {
    match config.storage_backend.as_str() {
        "filesystem" => {
            let path = PathBuf::from(&config.storage_path);
            fs::create_dir_all(&path).await?;
            Ok(Arc::new(FilesystemBlobStore::new(path)))
        }
        other => Err(AppError::Config(format!(
            "Unknown storage backend: {}",
            other
        ))),
    }
}
