//! Gateway over a singleton document stored under a fixed id.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use mediastore_cache::{CacheRead, CacheStore};
use mediastore_core::error::{AppError, ErrorKind};
use mediastore_core::events::ChangeEvent;
use mediastore_core::result::AppResult;
use mediastore_core::traits::backend::CollectionBackend;
use mediastore_entity::record::Record;
use mediastore_realtime::ChangeBus;

use super::{decode_row, settle};

/// Cached access to one document of collection `E`.
pub struct DocumentGateway<E: Record> {
    backend: Arc<dyn CollectionBackend>,
    cache: CacheStore,
    bus: ChangeBus,
    document_id: String,
    key: String,
    ttl: Duration,
    _record: PhantomData<fn() -> E>,
}

impl<E: Record> Clone for DocumentGateway<E> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            cache: self.cache.clone(),
            bus: self.bus.clone(),
            document_id: self.document_id.clone(),
            key: self.key.clone(),
            ttl: self.ttl,
            _record: PhantomData,
        }
    }
}

impl<E: Record> fmt::Debug for DocumentGateway<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentGateway")
            .field("collection", &E::COLLECTION)
            .field("document_id", &self.document_id)
            .finish()
    }
}

impl<E: Record> DocumentGateway<E> {
    /// Create a gateway for the document with the given id.
    pub fn new(
        backend: Arc<dyn CollectionBackend>,
        cache: CacheStore,
        bus: ChangeBus,
        document_id: impl Into<String>,
    ) -> Self {
        let document_id = document_id.into();
        let key = cache.document_key(E::COLLECTION, &document_id);
        let ttl = cache.default_ttl();
        Self {
            backend,
            cache,
            bus,
            document_id,
            key,
            ttl,
            _record: PhantomData,
        }
    }

    /// The fixed document id.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// The document, or `None` when it has never been saved.
    pub async fn get(&self, force: bool) -> AppResult<Option<E>> {
        if let CacheRead::Hit(doc) = self
            .cache
            .read::<Option<E>>(&self.key, self.ttl, force)
            .await?
        {
            return Ok(doc);
        }

        let ticket = self.cache.fill_ticket(&self.key);
        match self.backend.select_one(E::COLLECTION, &self.document_id).await {
            Ok(row) => {
                let doc = row.as_ref().and_then(decode_row::<E>);
                if let Err(e) = self
                    .cache
                    .write_through_if_current(&self.key, ticket, &doc)
                    .await
                {
                    warn!(collection = E::COLLECTION, error = %e, "Failed to cache document");
                }
                Ok(doc)
            }
            Err(e) => {
                warn!(
                    collection = E::COLLECTION,
                    id = %self.document_id,
                    error = %e,
                    "Backend read failed, serving last known good document"
                );
                match self.cache.fallback::<Option<E>>(&self.key).await {
                    Ok(doc) => Ok(doc.flatten()),
                    Err(e) if e.kind == ErrorKind::Serialization => {
                        warn!(collection = E::COLLECTION, error = %e, "Cached document unreadable");
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Create or replace the document.
    pub async fn save(&self, doc: &E) -> AppResult<()> {
        if doc.record_id() != self.document_id {
            return Err(AppError::validation(format!(
                "Document id must be '{}', got '{}'",
                self.document_id,
                doc.record_id()
            )));
        }
        self.cache.invalidate(&self.key).await?;

        let result = self.backend.upsert(E::COLLECTION, doc.to_row()).await;
        settle(&self.cache, &self.key, E::COLLECTION).await;
        result.map_err(|e| self.mutation_failed("save", e))?;

        info!(collection = E::COLLECTION, id = %self.document_id, "Document saved");
        self.bus
            .publish(ChangeEvent::saved(E::COLLECTION, &self.document_id));
        Ok(())
    }

    /// Apply a partial update to the existing document.
    pub async fn update(&self, patch: E::Patch) -> AppResult<E> {
        self.cache.invalidate(&self.key).await?;

        let result = self
            .backend
            .update(E::COLLECTION, &self.document_id, E::patch_row(&patch))
            .await;
        settle(&self.cache, &self.key, E::COLLECTION).await;
        let row = result
            .map_err(|e| self.mutation_failed("update", e))?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "{} document '{}' not found",
                    E::COLLECTION,
                    self.document_id
                ))
            })?;

        debug!(collection = E::COLLECTION, patch = ?patch, "Applied document patch");
        info!(collection = E::COLLECTION, id = %self.document_id, "Document updated");
        self.bus
            .publish(ChangeEvent::updated(E::COLLECTION, &self.document_id));

        E::from_row(&row).inspect_err(|e| {
            warn!(collection = E::COLLECTION, error = %e, "Updated document does not decode");
        })
    }

    fn mutation_failed(&self, operation: &str, err: AppError) -> AppError {
        warn!(
            collection = E::COLLECTION,
            id = %self.document_id,
            operation,
            error = %err,
            "Backend mutation failed"
        );
        err.into_mutation_failure()
    }
}
