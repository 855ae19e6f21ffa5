//! Shared harness for service integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Notify;

use mediastore_cache::{CacheStore, MemoryKeyValueStore};
use mediastore_core::config::AppConfig;
use mediastore_core::error::AppError;
use mediastore_core::result::AppResult;
use mediastore_core::traits::backend::CollectionBackend;
use mediastore_core::traits::storage::{BlobStore, UploadOptions};
use mediastore_core::types::{ItemId, Row};
use mediastore_database::MemoryCollectionBackend;
use mediastore_entity::media::BlobInfo;
use mediastore_entity::{MediaItem, Record};
use mediastore_service::ServiceContext;
use mediastore_storage::{MemoryBlobStore, PassthroughTransformer};

/// Memory backend that can go offline, reject chosen ids, and count calls.
#[derive(Debug, Default)]
pub struct FlakyBackend {
    inner: MemoryCollectionBackend,
    offline: AtomicBool,
    rejected: Mutex<HashSet<String>>,
    selects: AtomicUsize,
    mutations: AtomicUsize,
    gate: Mutex<Option<Arc<Notify>>>,
    parked: Notify,
}

impl FlakyBackend {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn reject(&self, id: &str) {
        self.rejected.lock().unwrap().insert(id.to_string());
    }

    pub fn select_calls(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }

    pub fn mutation_calls(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Make the next mutation wait until the returned handle is notified.
    pub fn hold_next_mutation(&self) -> Arc<Notify> {
        let release = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(release.clone());
        release
    }

    /// Resolves once a held mutation has reached the backend.
    pub async fn mutation_held(&self) {
        self.parked.notified().await;
    }

    async fn pass_gate(&self) {
        let release = self.gate.lock().unwrap().take();
        if let Some(release) = release {
            self.parked.notify_one();
            release.notified().await;
        }
    }

    /// Write a row directly, bypassing gateways and the cache.
    pub async fn seed(&self, collection: &str, row: Row) {
        self.inner.upsert(collection, row).await.unwrap();
    }

    fn check_online(&self) -> AppResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(AppError::remote_unavailable("backend offline"))
        } else {
            Ok(())
        }
    }

    fn check_mutation(&self, id: &str) -> AppResult<()> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.rejected.lock().unwrap().contains(id) {
            return Err(AppError::database(format!("row '{id}' rejected")));
        }
        Ok(())
    }
}

#[async_trait]
impl CollectionBackend for FlakyBackend {
    fn backend_type(&self) -> &str {
        "flaky"
    }

    async fn select_all(&self, collection: &str, order_by: Option<&str>) -> AppResult<Vec<Row>> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.inner.select_all(collection, order_by).await
    }

    async fn select_one(&self, collection: &str, id: &str) -> AppResult<Option<Row>> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.inner.select_one(collection, id).await
    }

    async fn upsert(&self, collection: &str, row: Row) -> AppResult<()> {
        let id = row.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        self.pass_gate().await;
        self.check_mutation(&id)?;
        self.inner.upsert(collection, row).await
    }

    async fn update(&self, collection: &str, id: &str, changes: Row) -> AppResult<Option<Row>> {
        self.pass_gate().await;
        self.check_mutation(id)?;
        self.inner.update(collection, id, changes).await
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        self.pass_gate().await;
        self.check_mutation(id)?;
        self.inner.delete(collection, id).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(!self.offline.load(Ordering::SeqCst))
    }
}

/// Memory blob store whose uploads can be made to fail.
#[derive(Debug)]
pub struct FlakyBlobStore {
    pub inner: MemoryBlobStore,
    fail_uploads: AtomicBool,
}

impl FlakyBlobStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryBlobStore::new("http://cdn.test/uploads"),
            fail_uploads: AtomicBool::new(false),
        }
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    fn provider_type(&self) -> &str {
        "flaky"
    }

    async fn upload(&self, path: &str, data: Bytes, options: UploadOptions) -> AppResult<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(AppError::storage("blob store unavailable"));
        }
        self.inner.upload(path, data, options).await
    }

    fn public_url(&self, path: &str) -> String {
        self.inner.public_url(path)
    }

    async fn remove(&self, paths: &[String]) -> AppResult<()> {
        self.inner.remove(paths).await
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        self.inner.exists(path).await
    }
}

pub struct Harness {
    pub backend: Arc<FlakyBackend>,
    pub blobs: Arc<FlakyBlobStore>,
    pub ctx: ServiceContext,
}

pub async fn harness() -> Harness {
    harness_with(AppConfig::default()).await
}

pub async fn harness_with(config: AppConfig) -> Harness {
    let backend = Arc::new(FlakyBackend::default());
    let blobs = Arc::new(FlakyBlobStore::new());
    let cache = CacheStore::with_store(
        Arc::new(MemoryKeyValueStore::new()),
        Duration::from_secs(60),
        128,
        "test",
    );
    cache.init().await.unwrap();

    let ctx = ServiceContext::assemble(
        &config,
        backend.clone(),
        cache,
        blobs.clone(),
        Arc::new(PassthroughTransformer),
    );
    Harness {
        backend,
        blobs,
        ctx,
    }
}

/// A file item with a blob key, not yet stored anywhere.
pub fn file_item(name: &str, parent: Option<&ItemId>) -> MediaItem {
    let id = ItemId::new();
    MediaItem::file(
        id.clone(),
        name,
        parent.cloned(),
        BlobInfo {
            url: format!("http://cdn.test/uploads/media/{id}/{name}"),
            size_bytes: 3,
            storage_key: format!("media/{id}/{name}"),
            mime_type: "image/jpeg".into(),
        },
    )
}

/// Seed a media item directly into the backend.
pub async fn seed_media(h: &Harness, item: &MediaItem) {
    h.backend.seed(MediaItem::COLLECTION, item.to_row()).await;
}

pub fn jpeg_bytes() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4]
}
