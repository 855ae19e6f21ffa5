//! Local filesystem blob store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use mediastore_core::error::{AppError, ErrorKind};
use mediastore_core::result::AppResult;
use mediastore_core::traits::storage::{BlobStore, UploadOptions};

use crate::url::{clean_path, join_public_url};

/// Blob store writing objects beneath a root directory.
///
/// Public URLs are built from a base URL that is expected to serve the
/// root directory (for example a static file server or CDN origin).
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    /// Create the store, creating the root directory if needed.
    pub async fn new(root_path: &str, public_base_url: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            public_base_url: public_base_url.to_string(),
        })
    }

    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        Ok(self.root.join(clean_path(path)?))
    }

    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        let Some(parent) = path.parent() else {
            return Ok(());
        };
        fs::create_dir_all(parent).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create parent directory: {}", parent.display()),
                e,
            )
        })
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn upload(&self, path: &str, data: Bytes, options: UploadOptions) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        if !options.overwrite && self.exists(path).await? {
            return Err(AppError::conflict(format!("Object already exists: {path}")));
        }
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to write object: {path}"), e)
        })?;

        debug!(
            path,
            bytes = data.len(),
            content_type = options.content_type.as_deref().unwrap_or("unknown"),
            "Stored blob"
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        join_public_url(&self.public_base_url, path)
    }

    async fn remove(&self, paths: &[String]) -> AppResult<()> {
        for path in paths {
            let full_path = self.resolve(path)?;
            match fs::remove_file(&full_path).await {
                Ok(()) => debug!(path = %path, "Removed blob"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to remove object: {path}"),
                        e,
                    ));
                }
            }
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        let full_path = self.resolve(path)?;
        fs::try_exists(&full_path).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to stat object: {path}"), e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store(dir: &tempfile::TempDir) -> LocalBlobStore {
        LocalBlobStore::new(dir.path().to_str().unwrap(), "http://localhost:8080/uploads")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_writes_beneath_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        store
            .upload("media/m1/a.jpg", Bytes::from_static(b"jpeg"), UploadOptions::default())
            .await
            .unwrap();

        let written = std::fs::read(dir.path().join("media/m1/a.jpg")).unwrap();
        assert_eq!(written, b"jpeg");
        assert_eq!(
            store.public_url("media/m1/a.jpg"),
            "http://localhost:8080/uploads/media/m1/a.jpg"
        );
    }

    #[tokio::test]
    async fn test_upload_without_overwrite_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        store
            .upload("a.bin", Bytes::from_static(b"1"), UploadOptions::default())
            .await
            .unwrap();
        let err = store
            .upload("a.bin", Bytes::from_static(b"2"), UploadOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let replace = UploadOptions {
            overwrite: true,
            content_type: None,
        };
        store
            .upload("a.bin", Bytes::from_static(b"2"), replace)
            .await
            .unwrap();
        assert_eq!(std::fs::read(dir.path().join("a.bin")).unwrap(), b"2");
    }

    #[tokio::test]
    async fn test_remove_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        store
            .upload("x/y.txt", Bytes::from_static(b"y"), UploadOptions::default())
            .await
            .unwrap();
        store
            .remove(&["x/y.txt".to_string(), "x/missing.txt".to_string()])
            .await
            .unwrap();
        assert!(!store.exists("x/y.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let err = store
            .upload("../escape.txt", Bytes::from_static(b"x"), UploadOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
