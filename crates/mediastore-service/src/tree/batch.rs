//! Results of tree operations that touch several items.

use mediastore_core::error::AppError;
use mediastore_core::types::ItemId;
use mediastore_entity::MediaItem;

/// Per-item outcome of a batch; partial failure is a value, not an error.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Items the operation succeeded for, in processing order.
    pub succeeded: Vec<ItemId>,
    /// Items the operation failed for, with the reason.
    pub failed: Vec<(ItemId, AppError)>,
}

impl BatchReport {
    /// An empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result for one item.
    pub fn record(&mut self, id: ItemId, result: Result<(), AppError>) {
        match result {
            Ok(()) => self.succeeded.push(id),
            Err(e) => self.failed.push((id, e)),
        }
    }

    /// Whether every item succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Whether the failures include the given id.
    pub fn failed_for(&self, id: &ItemId) -> Option<&AppError> {
        self.failed.iter().find(|(f, _)| f == id).map(|(_, e)| e)
    }

    /// Total number of items processed.
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Whether nothing was processed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of [`MediaTree::move_item`](super::MediaTree::move_item).
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// The item now lives under the new parent.
    Moved(MediaItem),
    /// The item already lived there; nothing was written.
    Unchanged,
}
