//! Remote collection backend trait.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::row::Row;

/// Trait for the remote, collection-oriented persistence service.
///
/// Rows are keyed by backend column names and always carry an `id` column.
/// Implementations exist for PostgreSQL and for an in-process store.
#[async_trait]
pub trait CollectionBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend type name (e.g., "postgres", "memory").
    fn backend_type(&self) -> &str;

    /// `SELECT * FROM <collection> [ORDER BY <column>]`.
    async fn select_all(&self, collection: &str, order_by: Option<&str>) -> AppResult<Vec<Row>>;

    /// Fetch the row with the given ID, if any.
    async fn select_one(&self, collection: &str, id: &str) -> AppResult<Option<Row>>;

    /// Insert a row, replacing the existing row with the same `id`.
    async fn upsert(&self, collection: &str, row: Row) -> AppResult<()>;

    /// Apply the given columns to the row with the given ID.
    ///
    /// Returns the full updated row, or `None` when no row matched.
    async fn update(&self, collection: &str, id: &str, changes: Row) -> AppResult<Option<Row>>;

    /// Delete the row with the given ID. Returns `false` when no row matched.
    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
