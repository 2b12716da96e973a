//! Filesystem blob storage backend.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::BlobStore;
use crate::error::{AppError, Result};

/// Filesystem-based blob store
pub struct FilesystemBlobStore {
    base_path: PathBuf,
}

impl FilesystemBlobStore {
    /// Create new filesystem blob store
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn key_to_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, key: &str, content: Bytes) -> Result<()> {
        let path = self.key_to_path(key);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write atomically via temp file
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&content).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &path).await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        let path = self.key_to_path(key);
        let content = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("Blob not found: {}", key))
            } else {
                AppError::Storage(e.to_string())
            }
        })?;
        Ok(Bytes::from(content))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.key_to_path(key);
        Ok(path.exists())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.key_to_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete {}: {}", key, e))),
        }
    }

    async fn size(&self, key: &str) -> Result<Option<u64>> {
        let path = self.key_to_path(key);
        match fs::metadata(&path).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FilesystemBlobStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FilesystemBlobStore::new(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_put_get() {
        let (store, _temp) = create_test_store();

        let content = Bytes::from("rendered pdf bytes");
        store.put("abc.pdf", content.clone()).await.unwrap();

        let retrieved = store.get("abc.pdf").await.unwrap();
        assert_eq!(retrieved, content);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (store, _temp) = create_test_store();

        let err = store.get("missing.pdf").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_exists() {
        let (store, _temp) = create_test_store();

        assert!(!store.exists("nope.xlsx").await.unwrap());

        store.put("yes.xlsx", Bytes::from("data")).await.unwrap();
        assert!(store.exists("yes.xlsx").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (store, _temp) = create_test_store();

        store.put("doomed.pdf", Bytes::from("data")).await.unwrap();
        store.delete("doomed.pdf").await.unwrap();
        assert!(!store.exists("doomed.pdf").await.unwrap());

        // Deleting again must not fail
        store.delete("doomed.pdf").await.unwrap();
    }

    #[tokio::test]
    async fn test_size_of_missing_blob_is_none() {
        let (store, _temp) = create_test_store();

        store.put("sized.pdf", Bytes::from("12345")).await.unwrap();
        assert_eq!(store.size("sized.pdf").await.unwrap(), Some(5));
        assert_eq!(store.size("absent.pdf").await.unwrap(), None);
    }
}
