//! Record trait and the row mapping helpers.
//!
//! Each record declares a static table of `(field, column)` pairs and an
//! explicit `to_row` / `from_row` pair that reads and writes struct fields
//! directly. This is the only place application field names and backend
//! column names meet.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use mediastore_core::error::AppError;
use mediastore_core::result::AppResult;
use mediastore_core::types::Row;

/// One entry of a record's field mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Application (camelCase) field name.
    pub field: &'static str,
    /// Backend (snake_case) column name.
    pub column: &'static str,
}

impl Column {
    /// Create a mapping entry.
    pub const fn new(field: &'static str, column: &'static str) -> Self {
        Self { field, column }
    }
}

/// A record stored in a named backend collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The backend collection (table) name.
    const COLLECTION: &'static str;

    /// Field mapping table, one entry per serialized field.
    const COLUMNS: &'static [Column];

    /// Column used to order `select_all`, if any.
    const ORDER_BY: Option<&'static str> = None;

    /// Partial update type for this record.
    type Patch: Send + Sync + std::fmt::Debug;

    /// The record's primary key.
    fn record_id(&self) -> &str;

    /// Convert into a backend row.
    fn to_row(&self) -> Row;

    /// Decode from a backend row.
    fn from_row(row: &Row) -> AppResult<Self>;

    /// Convert a partial update into the columns it touches.
    fn patch_row(patch: &Self::Patch) -> Row;

    /// Look up the backend column for an application field name.
    fn column_for(field: &str) -> Option<&'static str> {
        Self::COLUMNS
            .iter()
            .find(|c| c.field == field)
            .map(|c| c.column)
    }
}

/// Incremental builder for backend rows.
#[derive(Debug, Default)]
pub struct RowBuilder {
    row: Row,
}

impl RowBuilder {
    /// Start an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column to a serializable value.
    pub fn put(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.row.insert(column.to_string(), value.into());
        self
    }

    /// Set a column to an optional value, writing `null` for `None`.
    pub fn put_opt<T: Into<Value>>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.put(column, v),
            None => self.put(column, Value::Null),
        }
    }

    /// Set a column only when a value is given.
    pub fn put_if<T: Into<Value>>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.put(column, v),
            None => self,
        }
    }

    /// Set a timestamp column (RFC 3339).
    pub fn put_time(self, column: &str, value: DateTime<Utc>) -> Self {
        self.put(column, value.to_rfc3339())
    }

    /// Finish the row.
    pub fn build(self) -> Row {
        self.row
    }
}

/// Typed accessors over a backend row.
#[derive(Debug, Clone, Copy)]
pub struct RowReader<'a> {
    row: &'a Row,
    collection: &'static str,
}

impl<'a> RowReader<'a> {
    /// Wrap a row from the given collection.
    pub fn new(row: &'a Row, collection: &'static str) -> Self {
        Self { row, collection }
    }

    fn missing(&self, column: &str) -> AppError {
        AppError::new(
            mediastore_core::error::ErrorKind::Serialization,
            format!("{}: missing or invalid column '{column}'", self.collection),
        )
    }

    fn value(&self, column: &str) -> Option<&'a Value> {
        self.row.get(column).filter(|v| !v.is_null())
    }

    /// A required text column.
    pub fn string(&self, column: &str) -> AppResult<String> {
        self.opt_string(column).ok_or_else(|| self.missing(column))
    }

    /// An optional text column.
    pub fn opt_string(&self, column: &str) -> Option<String> {
        self.value(column)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// An optional non-negative integer column.
    pub fn opt_u64(&self, column: &str) -> Option<u64> {
        self.value(column).and_then(Value::as_u64)
    }

    /// An integer column, defaulting when absent.
    pub fn i64_or(&self, column: &str, default: i64) -> i64 {
        self.value(column).and_then(Value::as_i64).unwrap_or(default)
    }

    /// A boolean column, defaulting when absent.
    pub fn bool_or(&self, column: &str, default: bool) -> bool {
        self.value(column)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    /// A required RFC 3339 timestamp column.
    pub fn timestamp(&self, column: &str) -> AppResult<DateTime<Utc>> {
        let raw = self.string(column)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| {
                AppError::with_source(
                    mediastore_core::error::ErrorKind::Serialization,
                    format!("{}: invalid timestamp in '{column}'", self.collection),
                    e,
                )
            })
    }

    /// A JSON array of strings, empty when absent.
    pub fn string_list(&self, column: &str) -> Vec<String> {
        self.value(column)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Shared assertions for record mapping tables.
#[cfg(test)]
pub(crate) mod mapping_checks {
    use std::collections::BTreeSet;

    use super::Record;

    /// The mapping table covers every serialized field and every row column
    /// exactly once, and a row survives a decode/encode cycle.
    pub fn assert_total_mapping<E: Record + PartialEq + std::fmt::Debug>(sample: &E) {
        let fields: BTreeSet<&str> = E::COLUMNS.iter().map(|c| c.field).collect();
        let columns: BTreeSet<&str> = E::COLUMNS.iter().map(|c| c.column).collect();
        assert_eq!(fields.len(), E::COLUMNS.len(), "duplicate field in mapping");
        assert_eq!(columns.len(), E::COLUMNS.len(), "duplicate column in mapping");

        let json = serde_json::to_value(sample).unwrap();
        let serialized: BTreeSet<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(serialized, fields, "serde fields differ from mapping");

        let row = sample.to_row();
        let row_columns: BTreeSet<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(row_columns, columns, "row columns differ from mapping");

        let decoded = E::from_row(&row).unwrap();
        assert_eq!(&decoded, sample);
    }
}
