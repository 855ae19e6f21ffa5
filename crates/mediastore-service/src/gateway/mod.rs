//! Cached access to backend collections.

pub mod collection;
pub mod document;

pub use collection::PersistenceGateway;
pub use document::DocumentGateway;

use mediastore_cache::CacheStore;
use mediastore_core::types::Row;
use mediastore_entity::record::Record;
use tracing::warn;

/// Invalidate `key` again once a mutation has returned, so a fill that
/// read the backend while the mutation was in flight is discarded.
pub(crate) async fn settle(cache: &CacheStore, key: &str, collection: &str) {
    if let Err(e) = cache.invalidate(key).await {
        warn!(collection, key, error = %e, "Failed to invalidate after mutation");
    }
}

/// Decode one row, logging and dropping it when it does not map.
pub(crate) fn decode_row<E: Record>(row: &Row) -> Option<E> {
    match E::from_row(row) {
        Ok(item) => Some(item),
        Err(e) => {
            let id = row.get("id").and_then(|v| v.as_str()).unwrap_or("?");
            warn!(collection = E::COLLECTION, id, error = %e, "Skipping undecodable row");
            None
        }
    }
}
