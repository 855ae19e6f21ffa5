//! In-memory blob store.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use mediastore_core::error::AppError;
use mediastore_core::result::AppResult;
use mediastore_core::traits::storage::{BlobStore, UploadOptions};

use crate::url::{clean_path, join_public_url};

/// A stored object.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    /// Object content.
    pub data: Bytes,
    /// Recorded MIME type.
    pub content_type: Option<String>,
}

/// Blob store holding objects in process memory.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    objects: Arc<DashMap<String, StoredBlob>>,
    public_base_url: String,
}

impl MemoryBlobStore {
    /// Create an empty store serving URLs under `public_base_url`.
    pub fn new(public_base_url: &str) -> Self {
        Self {
            objects: Arc::new(DashMap::new()),
            public_base_url: public_base_url.to_string(),
        }
    }

    /// Fetch a stored object.
    pub fn get(&self, path: &str) -> Option<StoredBlob> {
        let path = clean_path(path).ok()?;
        self.objects.get(&path).map(|entry| entry.value().clone())
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no objects are stored.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn upload(&self, path: &str, data: Bytes, options: UploadOptions) -> AppResult<()> {
        let blob = StoredBlob {
            data,
            content_type: options.content_type,
        };
        match self.objects.entry(clean_path(path)?) {
            Entry::Occupied(_) if !options.overwrite => {
                Err(AppError::conflict(format!("Object already exists: {path}")))
            }
            Entry::Occupied(mut entry) => {
                entry.insert(blob);
                Ok(())
            }
            Entry::Vacant(entry) => {
                entry.insert(blob);
                Ok(())
            }
        }
    }

    fn public_url(&self, path: &str) -> String {
        join_public_url(&self.public_base_url, path)
    }

    async fn remove(&self, paths: &[String]) -> AppResult<()> {
        for path in paths {
            self.objects.remove(&clean_path(path)?);
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        Ok(self.objects.contains_key(&clean_path(path)?))
    }
}
