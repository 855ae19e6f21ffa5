//! Per-file upload progress.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use mediastore_core::types::ItemId;

/// Where a file is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Waiting for earlier files of the batch.
    Queued,
    /// Being transformed.
    Optimizing,
    /// Being written to blob storage.
    Uploading,
    /// Stored and recorded.
    Completed,
    /// Rejected or failed.
    Error,
}

impl UploadStatus {
    /// Whether the file will not change status again.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Optimizing => "optimizing",
            Self::Uploading => "uploading",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Snapshot of one tracked file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadEntry {
    /// Tracker-assigned id.
    pub upload_id: u64,
    /// Original file name.
    pub file_name: String,
    /// Current status.
    pub status: UploadStatus,
    /// Failure message when `status` is `error`.
    pub error: Option<String>,
    /// Created item when `status` is `completed`.
    pub item_id: Option<ItemId>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

/// Shared registry of upload progress, one entry per file.
///
/// Every change is also broadcast so a view can render live progress.
#[derive(Debug, Clone)]
pub struct UploadTracker {
    entries: Arc<DashMap<u64, UploadEntry>>,
    next_id: Arc<AtomicU64>,
    sender: broadcast::Sender<UploadEntry>,
}

impl UploadTracker {
    /// Create a tracker whose subscribers buffer up to `capacity` changes.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            entries: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            sender,
        }
    }

    /// Register a file as queued and return its upload id.
    pub fn enqueue(&self, file_name: impl Into<String>) -> u64 {
        let upload_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let entry = UploadEntry {
            upload_id,
            file_name: file_name.into(),
            status: UploadStatus::Queued,
            error: None,
            item_id: None,
            updated_at: Utc::now(),
        };
        self.entries.insert(upload_id, entry.clone());
        let _ = self.sender.send(entry);
        upload_id
    }

    fn modify(&self, upload_id: u64, apply: impl FnOnce(&mut UploadEntry)) -> bool {
        let snapshot = match self.entries.get_mut(&upload_id) {
            Some(mut entry) => {
                apply(&mut entry);
                entry.updated_at = Utc::now();
                entry.clone()
            }
            None => return false,
        };
        let _ = self.sender.send(snapshot);
        true
    }

    /// Move a file to a new in-progress status. Returns `false` when the
    /// file is no longer tracked.
    pub fn set_status(&self, upload_id: u64, status: UploadStatus) -> bool {
        self.modify(upload_id, |entry| entry.status = status)
    }

    /// Mark a file completed.
    pub fn complete(&self, upload_id: u64, item_id: ItemId) -> bool {
        self.modify(upload_id, |entry| {
            entry.status = UploadStatus::Completed;
            entry.item_id = Some(item_id);
        })
    }

    /// Mark a file failed.
    pub fn fail(&self, upload_id: u64, message: impl Into<String>) -> bool {
        self.modify(upload_id, |entry| {
            entry.status = UploadStatus::Error;
            entry.error = Some(message.into());
        })
    }

    /// Drop a file from the visible queue. A file that has not started is
    /// skipped; one already transferring finishes unreported.
    pub fn cancel(&self, upload_id: u64) -> bool {
        self.entries.remove(&upload_id).is_some()
    }

    /// Whether the file is still tracked.
    pub fn is_tracked(&self, upload_id: u64) -> bool {
        self.entries.contains_key(&upload_id)
    }

    /// Current state of one file.
    pub fn get(&self, upload_id: u64) -> Option<UploadEntry> {
        self.entries.get(&upload_id).map(|e| e.value().clone())
    }

    /// All tracked files in enqueue order.
    pub fn entries(&self) -> Vec<UploadEntry> {
        let mut entries: Vec<UploadEntry> = self.entries.iter().map(|e| e.value().clone()).collect();
        entries.sort_by_key(|e| e.upload_id);
        entries
    }

    /// Drop completed and failed entries. Returns how many were removed.
    pub fn clear_finished(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.status.is_finished());
        before - self.entries.len()
    }

    /// Observe every status change.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadEntry> {
        self.sender.subscribe()
    }
}

impl Default for UploadTracker {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_flow_and_clear() {
        let tracker = UploadTracker::default();
        let a = tracker.enqueue("a.jpg");
        let b = tracker.enqueue("b.mp4");
        let c = tracker.enqueue("c.png");

        assert!(tracker.set_status(a, UploadStatus::Optimizing));
        assert!(tracker.complete(a, ItemId::from("m1")));
        assert!(tracker.fail(b, "too large"));

        let statuses: Vec<UploadStatus> = tracker.entries().iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            [UploadStatus::Completed, UploadStatus::Error, UploadStatus::Queued]
        );
        assert_eq!(tracker.get(b).unwrap().error.as_deref(), Some("too large"));

        assert_eq!(tracker.clear_finished(), 2);
        assert_eq!(tracker.entries().len(), 1);
        assert!(tracker.is_tracked(c));
    }

    #[test]
    fn test_cancelled_entry_ignores_updates() {
        let tracker = UploadTracker::default();
        let id = tracker.enqueue("a.jpg");
        assert!(tracker.cancel(id));
        assert!(!tracker.cancel(id));
        assert!(!tracker.set_status(id, UploadStatus::Uploading));
        assert!(tracker.get(id).is_none());
    }

    #[tokio::test]
    async fn test_changes_are_broadcast() {
        let tracker = UploadTracker::new(16);
        let mut rx = tracker.subscribe();
        let id = tracker.enqueue("a.jpg");
        tracker.set_status(id, UploadStatus::Uploading);

        assert_eq!(rx.recv().await.unwrap().status, UploadStatus::Queued);
        assert_eq!(rx.recv().await.unwrap().status, UploadStatus::Uploading);
    }
}
