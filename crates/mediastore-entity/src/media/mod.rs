//! Media tree entities.

pub mod model;
pub mod sort;
pub mod tree;

pub use model::{BlobInfo, ItemKind, MediaItem, MediaMetadata, MediaPatch, base_name};
pub use sort::{MediaSortKey, sort_items};
pub use tree::TreeIndex;
