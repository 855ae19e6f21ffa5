//! PostgreSQL collection backend.
//!
//! Rows travel as JSON objects: reads go through `row_to_json` and writes
//! through `jsonb_populate_record`, so one implementation serves every
//! table without per-entity SQL. Collection and column names are validated
//! and quoted before they reach a statement.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::debug;

use mediastore_core::error::{AppError, ErrorKind};
use mediastore_core::result::AppResult;
use mediastore_core::traits::backend::CollectionBackend;
use mediastore_core::types::Row;

/// Collection backend over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgCollectionBackend {
    pool: PgPool,
}

impl PgCollectionBackend {
    /// Create a backend over an open pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Quote an SQL identifier after checking it is a plain lowercase name.
fn quote_ident(name: &str) -> AppResult<String> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(format!("\"{name}\""))
    } else {
        Err(AppError::validation(format!("Invalid identifier: '{name}'")))
    }
}

fn db_error(context: &str, collection: &str, err: sqlx::Error) -> AppError {
    AppError::with_source(
        ErrorKind::Database,
        format!("{context} in '{collection}': {err}"),
        err,
    )
}

fn select_all_sql(collection: &str, order_by: Option<&str>) -> AppResult<String> {
    let table = quote_ident(collection)?;
    let mut sql = format!("SELECT row_to_json(t) FROM {table} t");
    if let Some(column) = order_by {
        sql.push_str(&format!(" ORDER BY t.{}", quote_ident(column)?));
    }
    Ok(sql)
}

fn upsert_sql(collection: &str, row: &Row) -> AppResult<String> {
    let table = quote_ident(collection)?;
    let columns = row
        .keys()
        .map(|c| quote_ident(c))
        .collect::<AppResult<Vec<_>>>()?;
    let list = columns.join(", ");
    let updates = columns
        .iter()
        .filter(|c| c.as_str() != "\"id\"")
        .map(|c| format!("{c} = EXCLUDED.{c}"))
        .collect::<Vec<_>>();

    let conflict = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };
    Ok(format!(
        "INSERT INTO {table} ({list}) SELECT {list} FROM jsonb_populate_record(NULL::{table}, $1) \
         ON CONFLICT (\"id\") {conflict}"
    ))
}

fn update_sql(collection: &str, changes: &Row) -> AppResult<String> {
    let table = quote_ident(collection)?;
    let assignments = changes
        .keys()
        .filter(|c| c.as_str() != "id")
        .map(|c| quote_ident(c).map(|q| format!("{q} = r.{q}")))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(format!(
        "UPDATE {table} AS t SET {} FROM jsonb_populate_record(NULL::{table}, $1) AS r \
         WHERE t.\"id\" = $2 RETURNING row_to_json(t)",
        assignments.join(", ")
    ))
}

fn into_rows(values: Vec<Json<Value>>, collection: &str) -> Vec<Row> {
    values
        .into_iter()
        .filter_map(|Json(value)| match value {
            Value::Object(row) => Some(row),
            other => {
                debug!(collection, value = %other, "Skipping non-object row");
                None
            }
        })
        .collect()
}

#[async_trait]
impl CollectionBackend for PgCollectionBackend {
    fn backend_type(&self) -> &str {
        "postgres"
    }

    async fn select_all(&self, collection: &str, order_by: Option<&str>) -> AppResult<Vec<Row>> {
        let sql = select_all_sql(collection, order_by)?;
        let values = sqlx::query_scalar::<_, Json<Value>>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to select rows", collection, e))?;
        Ok(into_rows(values, collection))
    }

    async fn select_one(&self, collection: &str, id: &str) -> AppResult<Option<Row>> {
        let table = quote_ident(collection)?;
        let sql = format!("SELECT row_to_json(t) FROM {table} t WHERE t.\"id\" = $1");
        let value = sqlx::query_scalar::<_, Json<Value>>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to select row", collection, e))?;
        Ok(value.and_then(|v| into_rows(vec![v], collection).pop()))
    }

    async fn upsert(&self, collection: &str, row: Row) -> AppResult<()> {
        if !row.contains_key("id") {
            return Err(AppError::validation(format!(
                "Row for '{collection}' has no id column"
            )));
        }
        let sql = upsert_sql(collection, &row)?;
        sqlx::query(&sql)
            .bind(Json(Value::Object(row)))
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to upsert row", collection, e))?;
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, changes: Row) -> AppResult<Option<Row>> {
        if changes.keys().all(|c| c == "id") {
            return self.select_one(collection, id).await;
        }
        let sql = update_sql(collection, &changes)?;
        let value = sqlx::query_scalar::<_, Json<Value>>(&sql)
            .bind(Json(Value::Object(changes)))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update row", collection, e))?;
        Ok(value.and_then(|v| into_rows(vec![v], collection).pop()))
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        let table = quote_ident(collection)?;
        let sql = format!("DELETE FROM {table} WHERE \"id\" = $1");
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete row", collection, e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_quote_ident_rejects_injection() {
        assert_eq!(quote_ident("media").unwrap(), "\"media\"");
        assert_eq!(quote_ident("parent_id").unwrap(), "\"parent_id\"");
        assert!(quote_ident("media; DROP TABLE x").is_err());
        assert!(quote_ident("Media").is_err());
        assert!(quote_ident("").is_err());
        assert!(quote_ident("1abc").is_err());
    }

    #[test]
    fn test_select_all_sql() {
        assert_eq!(
            select_all_sql("media", Some("created_at")).unwrap(),
            "SELECT row_to_json(t) FROM \"media\" t ORDER BY t.\"created_at\""
        );
        assert_eq!(
            select_all_sql("settings", None).unwrap(),
            "SELECT row_to_json(t) FROM \"settings\" t"
        );
    }

    #[test]
    fn test_upsert_sql_never_updates_id() {
        let sql = upsert_sql(
            "media",
            &row(&[("id", "m1".into()), ("name", "a.jpg".into())]),
        )
        .unwrap();
        assert!(sql.starts_with("INSERT INTO \"media\" (\"id\", \"name\")"));
        assert!(sql.ends_with("ON CONFLICT (\"id\") DO UPDATE SET \"name\" = EXCLUDED.\"name\""));
    }

    #[test]
    fn test_update_sql_assigns_only_changed_columns() {
        let sql = update_sql(
            "media",
            &row(&[("parent_id", Value::Null), ("updated_at", "now".into())]),
        )
        .unwrap();
        assert!(sql.contains("SET \"parent_id\" = r.\"parent_id\", \"updated_at\" = r.\"updated_at\""));
        assert!(sql.ends_with("RETURNING row_to_json(t)"));
    }
}
