//! Folder and file operations on the media tree.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use mediastore_core::error::AppError;
use mediastore_core::result::AppResult;
use mediastore_core::traits::storage::BlobStore;
use mediastore_core::types::{ItemId, SortDirection};
use mediastore_entity::media::sort_items;
use mediastore_entity::{MediaItem, MediaMetadata, MediaPatch, MediaSortKey, TreeIndex};

use super::batch::{BatchReport, MoveOutcome};
use crate::gateway::PersistenceGateway;

/// The media tree: folders and files in one flat collection, linked by
/// parent id.
///
/// Every operation works on a fresh snapshot of the collection taken
/// through the gateway, so a mutation is always validated against the
/// state the cache considers current.
#[derive(Debug, Clone)]
pub struct MediaTree {
    gateway: PersistenceGateway<MediaItem>,
    blobs: Arc<dyn BlobStore>,
}

impl MediaTree {
    /// Creates a tree over the media gateway and the blob store holding
    /// file content.
    pub fn new(gateway: PersistenceGateway<MediaItem>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { gateway, blobs }
    }

    /// The underlying media gateway.
    pub fn gateway(&self) -> &PersistenceGateway<MediaItem> {
        &self.gateway
    }

    /// The blob store holding file content.
    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// Index the current collection.
    pub async fn snapshot(&self, force: bool) -> AppResult<TreeIndex> {
        Ok(TreeIndex::build(self.gateway.get_all(force).await?))
    }

    /// Look up one item.
    pub async fn get(&self, item_id: &ItemId) -> AppResult<MediaItem> {
        self.snapshot(false)
            .await?
            .get(item_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Media item '{item_id}' not found")))
    }

    /// Direct children of a folder, or of root for `None`, folders first.
    pub async fn list_children(
        &self,
        parent_id: Option<&ItemId>,
        sort: MediaSortKey,
        direction: SortDirection,
    ) -> AppResult<Vec<MediaItem>> {
        let tree = self.snapshot(false).await?;
        if let Some(parent) = parent_id {
            require_folder(&tree, parent)?;
        }
        let mut children: Vec<MediaItem> = tree.children(parent_id).into_iter().cloned().collect();
        sort_items(&mut children, sort, direction);
        Ok(children)
    }

    /// Ancestors of an item, root first, excluding the item itself.
    pub async fn breadcrumbs(&self, item_id: &ItemId) -> AppResult<Vec<MediaItem>> {
        let tree = self.snapshot(false).await?;
        if tree.get(item_id).is_none() {
            return Err(AppError::not_found(format!("Media item '{item_id}' not found")));
        }
        Ok(tree.ancestors(item_id).into_iter().cloned().collect())
    }

    /// Slash-separated display path, e.g. `/Photos 2024/sunset.jpg`.
    pub async fn path(&self, item_id: &ItemId) -> AppResult<String> {
        let tree = self.snapshot(false).await?;
        let item = tree
            .get(item_id)
            .ok_or_else(|| AppError::not_found(format!("Media item '{item_id}' not found")))?;

        let mut path = String::new();
        for segment in tree.ancestors(item_id).iter().chain(std::iter::once(&item)) {
            path.push('/');
            path.push_str(&segment.name);
        }
        Ok(path)
    }

    /// Move an item under a new parent folder, or to root for `None`.
    pub async fn move_item(
        &self,
        item_id: &ItemId,
        new_parent_id: Option<&ItemId>,
    ) -> AppResult<MoveOutcome> {
        let tree = self.snapshot(false).await?;
        let item = tree
            .get(item_id)
            .ok_or_else(|| AppError::not_found(format!("Media item '{item_id}' not found")))?;

        if let Some(target) = new_parent_id {
            if target == item_id {
                return Err(AppError::validation("Cannot move an item into itself"));
            }
            require_folder(&tree, target)?;
            if tree.is_within(target, item_id) {
                return Err(AppError::validation(format!(
                    "Cannot move '{}' into one of its own descendants",
                    item.name
                )));
            }
        }

        if item.parent_id.as_ref() == new_parent_id {
            return Ok(MoveOutcome::Unchanged);
        }

        let patch = MediaPatch::new().parent(new_parent_id.cloned());
        let moved = self.gateway.update(item_id.as_str(), patch).await?;
        info!(
            item_id = %item_id,
            parent_id = new_parent_id.map(ItemId::as_str).unwrap_or("root"),
            "Media item moved"
        );
        Ok(MoveOutcome::Moved(moved))
    }

    /// Rename an item, optionally updating its alt text and caption.
    pub async fn rename(
        &self,
        item_id: &ItemId,
        new_name: &str,
        metadata: Option<MediaMetadata>,
    ) -> AppResult<MediaItem> {
        let name = validate_name(new_name)?;
        let mut patch = MediaPatch::new().name(name);
        if let Some(metadata) = metadata {
            patch = patch.metadata(metadata);
        }

        let renamed = self.gateway.update(item_id.as_str(), patch).await?;
        info!(item_id = %item_id, name = %renamed.name, "Media item renamed");
        Ok(renamed)
    }

    /// Create a folder under an existing folder, or at root for `None`.
    pub async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&ItemId>,
    ) -> AppResult<MediaItem> {
        let name = validate_name(name)?;
        if let Some(parent) = parent_id {
            require_folder(&self.snapshot(false).await?, parent)?;
        }

        let folder = MediaItem::folder(name, parent_id.cloned());
        self.gateway.save(&folder).await?;
        info!(folder_id = %folder.id, name = %folder.name, "Folder created");
        Ok(folder)
    }

    /// Check that no file in the tree shares the candidate's base name.
    pub async fn ensure_unique_name(&self, file_name: &str) -> AppResult<()> {
        let tree = self.snapshot(false).await?;
        match tree.find_base_name_conflict(file_name) {
            Some(existing) => Err(AppError::conflict(format!(
                "A file named '{}' already exists ({})",
                existing.name, existing.id
            ))),
            None => Ok(()),
        }
    }

    /// Save a new file item after re-checking its name and parent.
    pub async fn insert_item(&self, item: &MediaItem) -> AppResult<()> {
        if item.is_folder() {
            return Err(AppError::validation("Use create_folder to add folders"));
        }
        validate_name(&item.name)?;

        let tree = self.snapshot(false).await?;
        if let Some(parent) = &item.parent_id {
            require_folder(&tree, parent)?;
        }
        if let Some(existing) = tree.find_base_name_conflict(&item.name) {
            return Err(AppError::conflict(format!(
                "A file named '{}' already exists ({})",
                existing.name, existing.id
            )));
        }

        self.gateway.save(item).await?;
        info!(item_id = %item.id, name = %item.name, kind = %item.kind, "Media item added");
        Ok(())
    }

    /// Fails when the given parent is not an existing folder.
    pub async fn require_parent(&self, parent_id: Option<&ItemId>) -> AppResult<()> {
        match parent_id {
            Some(parent) => require_folder(&self.snapshot(false).await?, parent),
            None => Ok(()),
        }
    }

    /// Delete one item without touching its children.
    pub async fn delete(&self, item_id: &ItemId) -> AppResult<()> {
        self.delete_shallow(item_id).await
    }

    /// Delete one item. Children of a deleted folder are orphaned and read
    /// as root items. Unknown ids succeed.
    pub async fn delete_shallow(&self, item_id: &ItemId) -> AppResult<()> {
        let tree = self.snapshot(false).await?;
        self.remove(item_id, tree.get(item_id)).await
    }

    /// Delete a folder's descendants deepest first, then the folder.
    ///
    /// A folder whose children could not all be deleted is kept and
    /// reported as failed.
    pub async fn delete_recursive(&self, item_id: &ItemId) -> AppResult<BatchReport> {
        let tree = self.snapshot(false).await?;
        let mut order: Vec<&MediaItem> = tree.descendants_deepest_first(item_id);
        let mut report = BatchReport::new();
        let mut blocked: HashSet<ItemId> = HashSet::new();

        let root = tree.get(item_id);
        if root.is_none() {
            report.record(item_id.clone(), self.remove(item_id, None).await);
            return Ok(report);
        }
        order.extend(root);

        for item in order {
            let child_failed = tree
                .children(Some(&item.id))
                .iter()
                .any(|child| blocked.contains(&child.id));
            let result = if child_failed {
                Err(AppError::conflict(format!(
                    "Folder '{}' still has children that could not be deleted",
                    item.name
                )))
            } else {
                self.remove(&item.id, Some(item)).await
            };
            if result.is_err() {
                blocked.insert(item.id.clone());
            }
            report.record(item.id.clone(), result);
        }

        info!(
            item_id = %item_id,
            deleted = report.succeeded.len(),
            failed = report.failed.len(),
            "Recursive delete finished"
        );
        Ok(report)
    }

    /// Delete several items independently.
    pub async fn bulk_delete(&self, ids: &[ItemId]) -> AppResult<BatchReport> {
        let tree = self.snapshot(false).await?;
        let mut report = BatchReport::new();
        for id in ids {
            report.record(id.clone(), self.remove(id, tree.get(id)).await);
        }
        if !report.is_complete() {
            warn!(failed = report.failed.len(), "Bulk delete partially failed");
        }
        Ok(report)
    }

    /// Move several items independently under the same parent.
    pub async fn bulk_move(
        &self,
        ids: &[ItemId],
        new_parent_id: Option<&ItemId>,
    ) -> AppResult<BatchReport> {
        let mut report = BatchReport::new();
        for id in ids {
            let result = self.move_item(id, new_parent_id).await.map(|_| ());
            report.record(id.clone(), result);
        }
        if !report.is_complete() {
            warn!(failed = report.failed.len(), "Bulk move partially failed");
        }
        Ok(report)
    }

    /// Remove a file's blob (if any) and then its record.
    async fn remove(&self, item_id: &ItemId, item: Option<&MediaItem>) -> AppResult<()> {
        if let Some(key) = item.and_then(|i| i.storage_key.as_ref()) {
            self.blobs.remove(std::slice::from_ref(key)).await?;
        }
        self.gateway.delete(item_id.as_str()).await
    }
}

/// Trim a display name and reject empty names or names containing a path
/// separator.
fn validate_name(name: &str) -> AppResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Name cannot be empty"));
    }
    if trimmed.contains(['/', '\\']) {
        return Err(AppError::validation(format!(
            "Name cannot contain a path separator: '{trimmed}'"
        )));
    }
    Ok(trimmed)
}

fn require_folder(tree: &TreeIndex, id: &ItemId) -> AppResult<()> {
    match tree.get(id) {
        Some(item) if item.is_folder() => Ok(()),
        Some(item) => Err(AppError::validation(format!("'{}' is not a folder", item.name))),
        None => Err(AppError::not_found(format!("Folder '{id}' not found"))),
    }
}
