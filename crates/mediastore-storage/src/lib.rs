//! # mediastore-storage
//!
//! Blob store implementations for uploaded media, plus the transformer that
//! recompresses images before they are stored.

pub mod local;
pub mod memory;
pub mod transform;
mod url;

use std::sync::Arc;

use tracing::info;

use mediastore_core::config::StorageConfig;
use mediastore_core::error::AppError;
use mediastore_core::result::AppResult;
use mediastore_core::traits::storage::BlobStore;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use transform::{ImageRecompressor, MediaTransformer, PassthroughTransformer};

/// Create the configured blob store.
pub async fn create_blob_store(config: &StorageConfig) -> AppResult<Arc<dyn BlobStore>> {
    match config.provider.as_str() {
        "local" => {
            info!(root = %config.local.root_path, "Using local blob store");
            let store = LocalBlobStore::new(&config.local.root_path, &config.public_base_url).await?;
            Ok(Arc::new(store))
        }
        "memory" => {
            info!("Using in-memory blob store");
            Ok(Arc::new(MemoryBlobStore::new(&config.public_base_url)))
        }
        other => Err(AppError::configuration(format!(
            "Unknown storage provider: '{other}'. Supported: local, memory"
        ))),
    }
}
