//! # mediastore-entity
//!
//! Domain records for MediaStore. Every record derives `Serialize` and
//! `Deserialize` in the application's camelCase naming and implements
//! [`Record`](record::Record), which maps it to and from backend rows in
//! snake_case column naming. The media module also holds the in-memory
//! tree index used by the tree service.

pub mod media;
pub mod project;
pub mod record;
pub mod settings;

pub use media::{ItemKind, MediaItem, MediaMetadata, MediaPatch, MediaSortKey, TreeIndex};
pub use project::{Project, ProjectPatch};
pub use record::{Column, Record, RowBuilder, RowReader};
pub use settings::{SettingsPatch, SiteSettings};
