//! Filesystem-backed object storage.
//!
//! Objects are written below a root directory that the HTTP layer serves under
//! `public_base_url`.

use super::ObjectStorage;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Stores objects as files under `root`.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    /// Creates the root directory if needed.
    pub async fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            Error::storage(format!(
                "Failed to create storage directory '{}': {e}",
                root.display()
            ))
        })?;

        Ok(Self {
            root,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Resolves a relative object path, refusing anything that leaves `root`.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                _ => {
                    return Err(Error::storage(format!("Invalid object path '{path}'")));
                }
            }
        }
        if resolved == self.root {
            return Err(Error::storage("Empty object path"));
        }
        Ok(resolved)
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::storage(format!("Failed to create folder for {path}: {e}")))?;
        }
        fs::write(&target, bytes)
            .await
            .map_err(|e| Error::storage(format!("Failed to write {path}: {e}")))?;

        debug!(path, size = bytes.len(), content_type, "Stored object");
        Ok(format!("{}/{}", self.public_base_url, path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        fs::remove_file(&target)
            .await
            .map_err(|e| Error::storage(format!("Failed to delete {path}: {e}")))?;

        debug!(path, "Deleted object");
        Ok(())
    }

    fn path_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
            .map(ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use tempfile::TempDir;

    async fn test_storage() -> (LocalObjectStorage, TempDir) {
        let dir = TempDir::new().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://localhost/uploads/")
            .await
            .unwrap();
        (storage, dir)
    }

    #[tokio::test]
    async fn test_put_and_delete() {
        let (storage, dir) = test_storage().await;

        let url = storage
            .put("user-1/scans/a.png", b"image-bytes", "image/png")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost/uploads/user-1/scans/a.png");

        let on_disk = dir.path().join("user-1/scans/a.png");
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"image-bytes");

        storage.delete("user-1/scans/a.png").await.unwrap();
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn test_delete_missing_is_error() {
        let (storage, _dir) = test_storage().await;
        assert!(matches!(
            storage.delete("user-1/missing.png").await,
            Err(Error::Storage { .. })
        ));
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (storage, _dir) = test_storage().await;
        assert!(storage.put("../escape.png", b"x", "image/png").await.is_err());
        assert!(storage.put("/etc/passwd", b"x", "image/png").await.is_err());
        assert!(storage.delete("a/../../b").await.is_err());
    }

    #[tokio::test]
    async fn test_path_for_url() {
        let (storage, _dir) = test_storage().await;
        assert_eq!(
            storage.path_for_url("http://localhost/uploads/user-1/a.png"),
            Some("user-1/a.png".to_string())
        );
        assert_eq!(storage.path_for_url("http://elsewhere/user-1/a.png"), None);
        assert_eq!(storage.path_for_url("http://localhost/uploads/"), None);
    }
}
