//! Blob storage trait for uploaded media content.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Options for [`BlobStore::upload`].
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Replace an existing object at the same path.
    pub overwrite: bool,
    /// MIME type to record with the object.
    pub content_type: Option<String>,
}

impl UploadOptions {
    /// Options carrying a content type and no overwrite.
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            overwrite: false,
            content_type: Some(content_type.into()),
        }
    }
}

/// Trait for object storage backends holding media blobs.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Store bytes at the given path.
    ///
    /// Fails with a conflict when the path exists and `overwrite` is false.
    async fn upload(&self, path: &str, data: Bytes, options: UploadOptions) -> AppResult<()>;

    /// Public URL under which the object at `path` is served.
    fn public_url(&self, path: &str) -> String;

    /// Remove the given paths. Paths that do not exist are ignored.
    async fn remove(&self, paths: &[String]) -> AppResult<()>;

    /// Check whether an object exists at the given path.
    async fn exists(&self, path: &str) -> AppResult<bool>;
}
