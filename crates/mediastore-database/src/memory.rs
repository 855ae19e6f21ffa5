//! In-process collection backend.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use mediastore_core::error::AppError;
use mediastore_core::result::AppResult;
use mediastore_core::traits::backend::CollectionBackend;
use mediastore_core::types::Row;

/// Collection backend that keeps rows in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryCollectionBackend {
    collections: Arc<RwLock<HashMap<String, Vec<Row>>>>,
}

impl MemoryCollectionBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows held for a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

/// Order JSON scalars the way a database would: nulls last, numbers
/// numerically, everything else by its string form.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl CollectionBackend for MemoryCollectionBackend {
    fn backend_type(&self) -> &str {
        "memory"
    }

    async fn select_all(&self, collection: &str, order_by: Option<&str>) -> AppResult<Vec<Row>> {
        let mut rows = self
            .collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default();
        if let Some(column) = order_by {
            rows.sort_by(|a, b| compare_values(a.get(column), b.get(column)));
        }
        Ok(rows)
    }

    async fn select_one(&self, collection: &str, id: &str) -> AppResult<Option<Row>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|rows| rows.iter().find(|r| row_id(r) == Some(id)))
            .cloned())
    }

    async fn upsert(&self, collection: &str, row: Row) -> AppResult<()> {
        let Some(id) = row_id(&row).map(str::to_string) else {
            return Err(AppError::validation(format!(
                "Row for '{collection}' has no id column"
            )));
        };
        let mut collections = self.collections.write().await;
        let rows = collections.entry(collection.to_string()).or_default();
        match rows.iter_mut().find(|r| row_id(r) == Some(id.as_str())) {
            Some(existing) => existing.extend(row),
            None => rows.push(row),
        }
        debug!(collection, id, "Upserted row");
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, changes: Row) -> AppResult<Option<Row>> {
        let mut collections = self.collections.write().await;
        let Some(existing) = collections
            .get_mut(collection)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(id)))
        else {
            return Ok(None);
        };
        existing.extend(changes.into_iter().filter(|(column, _)| column != "id"));
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        let mut collections = self.collections.write().await;
        let Some(rows) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| row_id(r) != Some(id));
        Ok(rows.len() < before)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let backend = MemoryCollectionBackend::new();
        backend
            .upsert("media", row(json!({"id": "a", "name": "one"})))
            .await
            .unwrap();
        backend
            .upsert("media", row(json!({"id": "a", "name": "two"})))
            .await
            .unwrap();

        let rows = backend.select_all("media", None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "two");
    }

    #[tokio::test]
    async fn test_select_all_orders_by_column() {
        let backend = MemoryCollectionBackend::new();
        for (id, order) in [("a", json!(3)), ("b", json!(1)), ("c", Value::Null), ("d", json!(2))] {
            backend
                .upsert("projects", row(json!({"id": id, "sort_order": order})))
                .await
                .unwrap();
        }
        let ids: Vec<String> = backend
            .select_all("projects", Some("sort_order"))
            .await
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, ["b", "d", "a", "c"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_report_missing_rows() {
        let backend = MemoryCollectionBackend::new();
        let missing = backend
            .update("media", "nope", row(json!({"name": "x"})))
            .await
            .unwrap();
        assert!(missing.is_none());
        assert!(!backend.delete("media", "nope").await.unwrap());

        backend
            .upsert("media", row(json!({"id": "a", "name": "one", "caption": "c"})))
            .await
            .unwrap();
        let updated = backend
            .update("media", "a", row(json!({"id": "zzz", "caption": null})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["id"], "a");
        assert_eq!(updated["name"], "one");
        assert!(updated["caption"].is_null());
        assert!(backend.delete("media", "a").await.unwrap());
        assert_eq!(backend.count("media").await, 0);
    }

    #[tokio::test]
    async fn test_row_without_id_is_rejected() {
        let backend = MemoryCollectionBackend::new();
        let err = backend
            .upsert("media", row(json!({"name": "x"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, mediastore_core::error::ErrorKind::Validation);
    }
}
