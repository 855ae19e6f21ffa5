//! Media item entity model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mediastore_core::error::AppError;
use mediastore_core::result::AppResult;
use mediastore_core::types::{ItemId, Row};

use crate::record::{Column, Record, RowBuilder, RowReader};

/// The kind of a media tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A folder; holds no content of its own.
    Folder,
    /// An image file.
    Image,
    /// A video file.
    Video,
    /// Any other file.
    Other,
}

impl ItemKind {
    /// Derive the kind of an uploaded file from its MIME type.
    pub fn from_mime(mime: &str) -> Self {
        let top = mime.split('/').next().unwrap_or_default();
        match top.to_ascii_lowercase().as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            _ => Self::Other,
        }
    }

    /// Whether this is the folder kind.
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder)
    }

    /// The lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Image => "image",
            Self::Video => "video",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(Self::Folder),
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "other" => Ok(Self::Other),
            other => Err(AppError::validation(format!("Unknown item kind: '{other}'"))),
        }
    }
}

/// Strip the last extension from a file name.
///
/// A leading dot does not start an extension, so `.env` stays `.env`.
pub fn base_name(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    }
}

/// A node of the media tree: a folder or a stored file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Unique, immutable identifier.
    pub id: ItemId,
    /// Display name (file name including extension for files).
    pub name: String,
    /// Folder or file kind.
    pub kind: ItemKind,
    /// Parent folder (None for root).
    pub parent_id: Option<ItemId>,
    /// Public URL of the stored blob.
    pub url: Option<String>,
    /// Stored blob size in bytes.
    pub size_bytes: Option<u64>,
    /// Blob storage path.
    pub storage_key: Option<String>,
    /// MIME type of the stored blob.
    pub mime_type: Option<String>,
    /// Alternative text for images.
    pub alt_text: Option<String>,
    /// Free-form caption.
    pub caption: Option<String>,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Blob attributes of an uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobInfo {
    /// Public URL.
    pub url: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Storage path.
    pub storage_key: String,
    /// MIME type.
    pub mime_type: String,
}

impl MediaItem {
    /// Build a new folder.
    pub fn folder(name: impl Into<String>, parent_id: Option<ItemId>) -> Self {
        let now = Utc::now();
        Self {
            id: ItemId::new(),
            name: name.into(),
            kind: ItemKind::Folder,
            parent_id,
            url: None,
            size_bytes: None,
            storage_key: None,
            mime_type: None,
            alt_text: None,
            caption: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build a new file item; the kind is derived from the blob's MIME type.
    pub fn file(
        id: ItemId,
        name: impl Into<String>,
        parent_id: Option<ItemId>,
        blob: BlobInfo,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            kind: ItemKind::from_mime(&blob.mime_type),
            parent_id,
            url: Some(blob.url),
            size_bytes: Some(blob.size_bytes),
            storage_key: Some(blob.storage_key),
            mime_type: Some(blob.mime_type),
            alt_text: None,
            caption: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this item is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    /// The name without its last extension.
    pub fn base_name(&self) -> &str {
        base_name(&self.name)
    }
}

/// Editable descriptive metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    /// Alternative text; `Some("")` clears it.
    pub alt_text: Option<String>,
    /// Caption; `Some("")` clears it.
    pub caption: Option<String>,
}

/// Partial update of a media item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaPatch {
    /// New name.
    pub name: Option<String>,
    /// New parent; `Some(None)` moves to root.
    pub parent_id: Option<Option<ItemId>>,
    /// New alt text; `Some(None)` clears it.
    pub alt_text: Option<Option<String>>,
    /// New caption; `Some(None)` clears it.
    pub caption: Option<Option<String>>,
    /// Modification timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl MediaPatch {
    /// Start a patch stamped with the current time.
    pub fn new() -> Self {
        Self {
            updated_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Change the parent.
    pub fn parent(mut self, parent_id: Option<ItemId>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Change the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Apply descriptive metadata; empty strings clear a field.
    pub fn metadata(mut self, metadata: MediaMetadata) -> Self {
        fn normalize(value: String) -> Option<String> {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        if let Some(alt) = metadata.alt_text {
            self.alt_text = Some(normalize(alt));
        }
        if let Some(caption) = metadata.caption {
            self.caption = Some(normalize(caption));
        }
        self
    }
}

const MEDIA_COLUMNS: &[Column] = &[
    Column::new("id", "id"),
    Column::new("name", "name"),
    Column::new("kind", "kind"),
    Column::new("parentId", "parent_id"),
    Column::new("url", "url"),
    Column::new("sizeBytes", "size_bytes"),
    Column::new("storageKey", "storage_key"),
    Column::new("mimeType", "mime_type"),
    Column::new("altText", "alt_text"),
    Column::new("caption", "caption"),
    Column::new("createdAt", "created_at"),
    Column::new("updatedAt", "updated_at"),
];

impl Record for MediaItem {
    const COLLECTION: &'static str = "media";
    const COLUMNS: &'static [Column] = MEDIA_COLUMNS;
    const ORDER_BY: Option<&'static str> = Some("created_at");

    type Patch = MediaPatch;

    fn record_id(&self) -> &str {
        self.id.as_str()
    }

    fn to_row(&self) -> Row {
        RowBuilder::new()
            .put("id", self.id.as_str())
            .put("name", self.name.as_str())
            .put("kind", self.kind.as_str())
            .put_opt("parent_id", self.parent_id.as_ref().map(ItemId::as_str))
            .put_opt("url", self.url.as_deref())
            .put_opt("size_bytes", self.size_bytes)
            .put_opt("storage_key", self.storage_key.as_deref())
            .put_opt("mime_type", self.mime_type.as_deref())
            .put_opt("alt_text", self.alt_text.as_deref())
            .put_opt("caption", self.caption.as_deref())
            .put_time("created_at", self.created_at)
            .put_time("updated_at", self.updated_at)
            .build()
    }

    fn from_row(row: &Row) -> AppResult<Self> {
        let r = RowReader::new(row, Self::COLLECTION);
        Ok(Self {
            id: ItemId::from(r.string("id")?),
            name: r.string("name")?,
            kind: r.string("kind")?.parse()?,
            parent_id: r.opt_string("parent_id").map(ItemId::from),
            url: r.opt_string("url"),
            size_bytes: r.opt_u64("size_bytes"),
            storage_key: r.opt_string("storage_key"),
            mime_type: r.opt_string("mime_type"),
            alt_text: r.opt_string("alt_text"),
            caption: r.opt_string("caption"),
            created_at: r.timestamp("created_at")?,
            updated_at: r.timestamp("updated_at")?,
        })
    }

    fn patch_row(patch: &MediaPatch) -> Row {
        let mut row = RowBuilder::new().put_if("name", patch.name.as_deref());
        if let Some(parent) = &patch.parent_id {
            row = row.put_opt("parent_id", parent.as_ref().map(ItemId::as_str));
        }
        if let Some(alt) = &patch.alt_text {
            row = row.put_opt("alt_text", alt.as_deref());
        }
        if let Some(caption) = &patch.caption {
            row = row.put_opt("caption", caption.as_deref());
        }
        if let Some(updated_at) = patch.updated_at {
            row = row.put_time("updated_at", updated_at);
        }
        row.build()
    }
}
