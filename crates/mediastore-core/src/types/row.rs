//! Backend row representation.
//!
//! A row is a JSON object keyed by backend column names (snake_case). Only
//! the entity mapping functions in `mediastore-entity` translate between
//! rows and typed records.

/// A single backend row keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;
