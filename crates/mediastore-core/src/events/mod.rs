//! Change events emitted by successful gateway mutations.
//!
//! Events carry the collection name so subscribers can filter; they are
//! re-read hints, not replication payloads. Observers react by reading the
//! collection again through its gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeKind {
    /// A record was created or replaced.
    Saved {
        /// The record ID.
        record_id: String,
    },
    /// A record was partially updated.
    Updated {
        /// The record ID.
        record_id: String,
    },
    /// A record was deleted (or was already gone).
    Deleted {
        /// The record ID.
        record_id: String,
    },
}

impl ChangeKind {
    /// The ID of the record this change refers to.
    pub fn record_id(&self) -> &str {
        match self {
            Self::Saved { record_id } | Self::Updated { record_id } | Self::Deleted { record_id } => {
                record_id
            }
        }
    }
}

/// A mutation notification scoped to one collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// The collection that changed.
    pub collection: String,
    /// The change itself.
    pub kind: ChangeKind,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    /// Create a new change event.
    pub fn new(collection: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            collection: collection.into(),
            kind,
            timestamp: Utc::now(),
        }
    }

    /// A record was saved.
    pub fn saved(collection: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self::new(
            collection,
            ChangeKind::Saved {
                record_id: record_id.into(),
            },
        )
    }

    /// A record was updated.
    pub fn updated(collection: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self::new(
            collection,
            ChangeKind::Updated {
                record_id: record_id.into(),
            },
        )
    }

    /// A record was deleted.
    pub fn deleted(collection: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self::new(
            collection,
            ChangeKind::Deleted {
                record_id: record_id.into(),
            },
        )
    }
}
