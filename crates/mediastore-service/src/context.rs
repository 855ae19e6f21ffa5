//! Wiring of every service from configuration.

use std::sync::Arc;

use tracing::info;

use mediastore_cache::CacheStore;
use mediastore_core::config::AppConfig;
use mediastore_core::result::AppResult;
use mediastore_core::traits::backend::CollectionBackend;
use mediastore_core::traits::storage::BlobStore;
use mediastore_entity::{MediaItem, Project, SiteSettings};
use mediastore_realtime::ChangeBus;
use mediastore_storage::{ImageRecompressor, MediaTransformer};

use crate::gateway::{DocumentGateway, PersistenceGateway};
use crate::tree::MediaTree;
use crate::upload::UploadPipeline;

/// The process-wide set of services, built once at startup.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    /// Shared cache layer.
    pub cache: CacheStore,
    /// Shared change bus.
    pub bus: ChangeBus,
    /// Remote collection backend.
    pub backend: Arc<dyn CollectionBackend>,
    /// Media tree over the `media` collection.
    pub media: MediaTree,
    /// Upload pipeline feeding the media tree.
    pub uploads: UploadPipeline,
    /// Gateway over the `projects` collection.
    pub projects: PersistenceGateway<Project>,
    /// Gateway over the site settings document.
    pub settings: DocumentGateway<SiteSettings>,
}

impl ServiceContext {
    /// Connect every backend named by the configuration and build the
    /// services on top of them.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let backend = mediastore_database::connect_backend(&config.database).await?;
        let cache = CacheStore::new(&config.cache)?;
        cache.init().await?;
        let blobs = mediastore_storage::create_blob_store(&config.storage).await?;
        let transformer = Arc::new(ImageRecompressor::new(config.upload.image.clone()));

        let context = Self::assemble(config, backend, cache, blobs, transformer);
        info!(
            backend = context.backend.backend_type(),
            blobs = context.media.blobs().provider_type(),
            "Services ready"
        );
        Ok(context)
    }

    /// Build the services over already constructed dependencies. The cache
    /// must be initialised.
    pub fn assemble(
        config: &AppConfig,
        backend: Arc<dyn CollectionBackend>,
        cache: CacheStore,
        blobs: Arc<dyn BlobStore>,
        transformer: Arc<dyn MediaTransformer>,
    ) -> Self {
        let bus = ChangeBus::from_config(&config.realtime);

        let media_gateway =
            PersistenceGateway::<MediaItem>::new(Arc::clone(&backend), cache.clone(), bus.clone());
        let media = MediaTree::new(media_gateway, blobs);
        let uploads = UploadPipeline::new(
            media.clone(),
            transformer,
            config.upload.clone(),
            config.storage.key_prefix.clone(),
        );
        let projects = PersistenceGateway::new(Arc::clone(&backend), cache.clone(), bus.clone());
        let settings = DocumentGateway::new(
            Arc::clone(&backend),
            cache.clone(),
            bus.clone(),
            SiteSettings::DOCUMENT_ID,
        );

        Self {
            cache,
            bus,
            backend,
            media,
            uploads,
            projects,
            settings,
        }
    }

    /// Release the cache. Services must not be used afterwards.
    pub async fn shutdown(&self) {
        self.cache.dispose().await;
    }
}
