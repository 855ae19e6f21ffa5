//! Read-through, write-invalidate gateway over one collection.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use mediastore_cache::{CacheRead, CacheStore};
use mediastore_core::error::AppError;
use mediastore_core::events::ChangeEvent;
use mediastore_core::result::AppResult;
use mediastore_core::traits::backend::CollectionBackend;
use mediastore_entity::record::Record;
use mediastore_realtime::ChangeBus;

use super::{decode_row, settle};

/// CRUD access to the collection of `E`.
///
/// Reads are served from the cache while fresh and fall back to the last
/// known good snapshot when the backend cannot be reached. Every mutation
/// invalidates the collection entry before it is sent and again once the
/// backend answered, then publishes a change event if it was accepted.
pub struct PersistenceGateway<E: Record> {
    backend: Arc<dyn CollectionBackend>,
    cache: CacheStore,
    bus: ChangeBus,
    key: String,
    ttl: Duration,
    _record: PhantomData<fn() -> E>,
}

impl<E: Record> Clone for PersistenceGateway<E> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            cache: self.cache.clone(),
            bus: self.bus.clone(),
            key: self.key.clone(),
            ttl: self.ttl,
            _record: PhantomData,
        }
    }
}

impl<E: Record> fmt::Debug for PersistenceGateway<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("collection", &E::COLLECTION)
            .field("backend", &self.backend.backend_type())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<E: Record> PersistenceGateway<E> {
    /// Create a gateway using the cache's default TTL.
    pub fn new(backend: Arc<dyn CollectionBackend>, cache: CacheStore, bus: ChangeBus) -> Self {
        let key = cache.collection_key(E::COLLECTION);
        let ttl = cache.default_ttl();
        Self {
            backend,
            cache,
            bus,
            key,
            ttl,
            _record: PhantomData,
        }
    }

    /// Override the freshness window for this collection.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The backend collection name.
    pub fn collection(&self) -> &'static str {
        E::COLLECTION
    }

    /// The change bus this gateway publishes on.
    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    /// Every record of the collection.
    ///
    /// `force` skips the cache read; the fetched list is still cached.
    pub async fn get_all(&self, force: bool) -> AppResult<Vec<E>> {
        if let CacheRead::Hit(items) = self.cache.read::<Vec<E>>(&self.key, self.ttl, force).await? {
            return Ok(items);
        }

        let ticket = self.cache.fill_ticket(&self.key);
        match self.backend.select_all(E::COLLECTION, E::ORDER_BY).await {
            Ok(rows) => {
                let total = rows.len();
                let items: Vec<E> = rows.iter().filter_map(decode_row::<E>).collect();
                debug!(
                    collection = E::COLLECTION,
                    rows = total,
                    decoded = items.len(),
                    "Fetched collection"
                );
                if let Err(e) = self
                    .cache
                    .write_through_if_current(&self.key, ticket, &items)
                    .await
                {
                    warn!(collection = E::COLLECTION, error = %e, "Failed to cache collection");
                }
                Ok(items)
            }
            Err(e) => {
                warn!(
                    collection = E::COLLECTION,
                    error = %e,
                    "Backend read failed, serving last known good snapshot"
                );
                self.fallback().await
            }
        }
    }

    async fn fallback(&self) -> AppResult<Vec<E>> {
        match self.cache.fallback::<Vec<E>>(&self.key).await {
            Ok(Some(items)) => Ok(items),
            Ok(None) => {
                warn!(collection = E::COLLECTION, "No snapshot available, returning empty list");
                Ok(Vec::new())
            }
            Err(e) if e.kind == mediastore_core::error::ErrorKind::Serialization => {
                warn!(collection = E::COLLECTION, error = %e, "Snapshot unreadable, returning empty list");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// One record by id, looked up in the collection snapshot.
    pub async fn find(&self, id: &str, force: bool) -> AppResult<Option<E>> {
        Ok(self
            .get_all(force)
            .await?
            .into_iter()
            .find(|item| item.record_id() == id))
    }

    /// Create or replace a record.
    pub async fn save(&self, item: &E) -> AppResult<()> {
        self.cache.invalidate(&self.key).await?;

        let id = item.record_id();
        let result = self.backend.upsert(E::COLLECTION, item.to_row()).await;
        settle(&self.cache, &self.key, E::COLLECTION).await;
        result.map_err(|e| self.mutation_failed("save", id, e))?;

        info!(collection = E::COLLECTION, id, "Record saved");
        self.bus.publish(ChangeEvent::saved(E::COLLECTION, id));
        Ok(())
    }

    /// Apply a partial update and return the updated record.
    pub async fn update(&self, id: &str, patch: E::Patch) -> AppResult<E> {
        self.cache.invalidate(&self.key).await?;

        let changes = E::patch_row(&patch);
        let result = self.backend.update(E::COLLECTION, id, changes).await;
        settle(&self.cache, &self.key, E::COLLECTION).await;
        let row = result
            .map_err(|e| self.mutation_failed("update", id, e))?
            .ok_or_else(|| {
                AppError::not_found(format!("{} record '{id}' not found", E::COLLECTION))
            })?;

        info!(collection = E::COLLECTION, id, "Record updated");
        self.bus.publish(ChangeEvent::updated(E::COLLECTION, id));

        E::from_row(&row).inspect_err(|e| {
            warn!(collection = E::COLLECTION, id, error = %e, "Updated row does not decode");
        })
    }

    /// Delete a record. Deleting an id that no longer exists succeeds.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.cache.invalidate(&self.key).await?;

        let result = self.backend.delete(E::COLLECTION, id).await;
        settle(&self.cache, &self.key, E::COLLECTION).await;
        let removed = result.map_err(|e| self.mutation_failed("delete", id, e))?;

        if removed {
            info!(collection = E::COLLECTION, id, "Record deleted");
        } else {
            debug!(collection = E::COLLECTION, id, "Record already gone");
        }
        self.bus.publish(ChangeEvent::deleted(E::COLLECTION, id));
        Ok(())
    }

    fn mutation_failed(&self, operation: &str, id: &str, err: AppError) -> AppError {
        warn!(collection = E::COLLECTION, id, operation, error = %err, "Backend mutation failed");
        err.into_mutation_failure()
    }
}
