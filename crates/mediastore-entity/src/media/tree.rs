//! Arena index over a flat media collection.
//!
//! Items are stored by id; the parent-child relation is derived from each
//! item's `parent_id` into a separate index. A parent reference that does
//! not resolve to an existing folder is dangling, and the item is listed at
//! root.

use std::collections::{HashMap, HashSet};

use mediastore_core::types::ItemId;

use super::model::{MediaItem, base_name};

/// Read-only tree view built from one snapshot of the media collection.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    items: HashMap<ItemId, MediaItem>,
    children: HashMap<Option<ItemId>, Vec<ItemId>>,
}

impl TreeIndex {
    /// Build the index from a collection snapshot.
    pub fn build(items: Vec<MediaItem>) -> Self {
        let items: HashMap<ItemId, MediaItem> =
            items.into_iter().map(|i| (i.id.clone(), i)).collect();

        let mut children: HashMap<Option<ItemId>, Vec<ItemId>> = HashMap::new();
        for item in items.values() {
            let parent = Self::resolve_parent(&items, item).cloned();
            children.entry(parent).or_default().push(item.id.clone());
        }

        Self { items, children }
    }

    fn resolve_parent<'a>(
        items: &'a HashMap<ItemId, MediaItem>,
        item: &'a MediaItem,
    ) -> Option<&'a ItemId> {
        item.parent_id
            .as_ref()
            .filter(|pid| *pid != &item.id)
            .filter(|pid| items.get(*pid).is_some_and(MediaItem::is_folder))
    }

    /// Number of items in the snapshot.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the snapshot holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up an item by id.
    pub fn get(&self, id: &ItemId) -> Option<&MediaItem> {
        self.items.get(id)
    }

    /// Whether the id names an existing folder.
    pub fn is_folder(&self, id: &ItemId) -> bool {
        self.items.get(id).is_some_and(MediaItem::is_folder)
    }

    /// Iterate over every item in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &MediaItem> {
        self.items.values()
    }

    /// The parent an item is listed under; dangling parents resolve to root.
    pub fn effective_parent<'a>(&'a self, item: &'a MediaItem) -> Option<&'a ItemId> {
        Self::resolve_parent(&self.items, item)
    }

    /// Direct children of a folder (or of root for `None`), unsorted.
    pub fn children(&self, parent: Option<&ItemId>) -> Vec<&MediaItem> {
        self.children
            .get(&parent.cloned())
            .map(|ids| ids.iter().filter_map(|id| self.items.get(id)).collect())
            .unwrap_or_default()
    }

    /// Ancestors of an item, root first, excluding the item itself.
    ///
    /// The walk stops at the first parent that is missing or not a folder,
    /// and at any id already visited.
    pub fn ancestors(&self, id: &ItemId) -> Vec<&MediaItem> {
        let mut chain = Vec::new();
        let mut visited = HashSet::from([id.clone()]);
        let mut current = self.items.get(id);

        while let Some(item) = current {
            let Some(parent) = self.effective_parent(item) else {
                break;
            };
            if !visited.insert(parent.clone()) {
                break;
            }
            let parent_item = &self.items[parent];
            chain.push(parent_item);
            current = Some(parent_item);
        }

        chain.reverse();
        chain
    }

    /// Whether `candidate` is `ancestor` itself or lies beneath it.
    pub fn is_within(&self, candidate: &ItemId, ancestor: &ItemId) -> bool {
        candidate == ancestor || self.ancestors(candidate).iter().any(|a| &a.id == ancestor)
    }

    /// Every descendant of an item, deepest first, excluding the item.
    pub fn descendants_deepest_first(&self, id: &ItemId) -> Vec<&MediaItem> {
        let mut ordered = Vec::new();
        let mut visited = HashSet::from([id.clone()]);
        let mut frontier = vec![id.clone()];

        while let Some(next) = frontier.pop() {
            for child in self.children(Some(&next)) {
                if visited.insert(child.id.clone()) {
                    ordered.push(child);
                    frontier.push(child.id.clone());
                }
            }
        }

        ordered.sort_by_key(|item| std::cmp::Reverse(self.ancestors(&item.id).len()));
        ordered
    }

    /// The first non-folder item whose base name equals the candidate's.
    pub fn find_base_name_conflict(&self, file_name: &str) -> Option<&MediaItem> {
        let candidate = base_name(file_name);
        self.items
            .values()
            .filter(|item| !item.is_folder())
            .find(|item| item.base_name() == candidate)
    }
}
