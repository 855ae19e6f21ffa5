//! Project entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mediastore_core::result::AppResult;
use mediastore_core::types::{ProjectId, Row};

use crate::record::{Column, Record, RowBuilder, RowReader};

/// A portfolio project shown on the marketing site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique project identifier.
    pub id: ProjectId,
    /// Project title.
    pub title: String,
    /// URL slug.
    pub slug: String,
    /// Short summary.
    pub summary: Option<String>,
    /// Cover image URL (usually a media item URL).
    pub cover_url: Option<String>,
    /// Whether the project is publicly listed.
    pub published: bool,
    /// Position in listings (ascending).
    pub sort_order: i64,
    /// When the project was created.
    pub created_at: DateTime<Utc>,
    /// When the project was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Build a new unpublished project.
    pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            title: title.into(),
            slug: slug.into(),
            summary: None,
            cover_url: None,
            published: false,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a project.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    /// New title.
    pub title: Option<String>,
    /// New summary; `Some(None)` clears it.
    pub summary: Option<Option<String>>,
    /// New cover URL; `Some(None)` clears it.
    pub cover_url: Option<Option<String>>,
    /// New published flag.
    pub published: Option<bool>,
    /// New position.
    pub sort_order: Option<i64>,
    /// Modification timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProjectPatch {
    /// An empty patch stamped with the current time.
    pub fn new() -> Self {
        Self {
            updated_at: Some(Utc::now()),
            ..Self::default()
        }
    }
}

const PROJECT_COLUMNS: &[Column] = &[
    Column::new("id", "id"),
    Column::new("title", "title"),
    Column::new("slug", "slug"),
    Column::new("summary", "summary"),
    Column::new("coverUrl", "cover_url"),
    Column::new("published", "published"),
    Column::new("sortOrder", "sort_order"),
    Column::new("createdAt", "created_at"),
    Column::new("updatedAt", "updated_at"),
];

impl Record for Project {
    const COLLECTION: &'static str = "projects";
    const COLUMNS: &'static [Column] = PROJECT_COLUMNS;
    const ORDER_BY: Option<&'static str> = Some("sort_order");

    type Patch = ProjectPatch;

    fn record_id(&self) -> &str {
        self.id.as_str()
    }

    fn to_row(&self) -> Row {
        RowBuilder::new()
            .put("id", self.id.as_str())
            .put("title", self.title.as_str())
            .put("slug", self.slug.as_str())
            .put_opt("summary", self.summary.as_deref())
            .put_opt("cover_url", self.cover_url.as_deref())
            .put("published", self.published)
            .put("sort_order", self.sort_order)
            .put_time("created_at", self.created_at)
            .put_time("updated_at", self.updated_at)
            .build()
    }

    fn from_row(row: &Row) -> AppResult<Self> {
        let r = RowReader::new(row, Self::COLLECTION);
        Ok(Self {
            id: ProjectId::from(r.string("id")?),
            title: r.string("title")?,
            slug: r.string("slug")?,
            summary: r.opt_string("summary"),
            cover_url: r.opt_string("cover_url"),
            published: r.bool_or("published", false),
            sort_order: r.i64_or("sort_order", 0),
            created_at: r.timestamp("created_at")?,
            updated_at: r.timestamp("updated_at")?,
        })
    }

    fn patch_row(patch: &ProjectPatch) -> Row {
        let mut row = RowBuilder::new()
            .put_if("title", patch.title.as_deref())
            .put_if("published", patch.published)
            .put_if("sort_order", patch.sort_order);
        if let Some(summary) = &patch.summary {
            row = row.put_opt("summary", summary.as_deref());
        }
        if let Some(cover) = &patch.cover_url {
            row = row.put_opt("cover_url", cover.as_deref());
        }
        if let Some(updated_at) = patch.updated_at {
            row = row.put_time("updated_at", updated_at);
        }
        row.build()
    }
}
