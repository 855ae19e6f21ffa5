//! Durable key-value store trait backing the cache layer.

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for the durable local store behind the cache (memory or file).
///
/// All values are strings (JSON). The store has no notion of expiry; the
/// cache layer keeps freshness timestamps under separate keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the store type name (e.g., "memory", "file").
    fn store_type(&self) -> &str;

    /// Prepare the store for use (create directories, open handles).
    async fn init(&self) -> AppResult<()> {
        Ok(())
    }

    /// Get a value by key. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// List every key starting with the given prefix.
    async fn keys(&self, prefix: &str) -> AppResult<Vec<String>>;
}
