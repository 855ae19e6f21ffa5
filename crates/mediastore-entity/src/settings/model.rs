//! Site settings document model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mediastore_core::result::AppResult;
use mediastore_core::types::Row;

use crate::record::{Column, Record, RowBuilder, RowReader};

/// Site-wide settings, stored as one document under a fixed id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    /// Always [`SiteSettings::DOCUMENT_ID`].
    pub id: String,
    /// Site title.
    pub site_title: String,
    /// Tagline under the title.
    pub tagline: Option<String>,
    /// Public contact address.
    pub contact_email: Option<String>,
    /// Landing page headline.
    pub hero_headline: Option<String>,
    /// Social profile URLs.
    pub social_links: Vec<String>,
    /// When the document was last updated.
    pub updated_at: DateTime<Utc>,
}

impl SiteSettings {
    /// The fixed document id.
    pub const DOCUMENT_ID: &'static str = "site";

    /// Settings with only a title.
    pub fn new(site_title: impl Into<String>) -> Self {
        Self {
            id: Self::DOCUMENT_ID.to_string(),
            site_title: site_title.into(),
            tagline: None,
            contact_email: None,
            hero_headline: None,
            social_links: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}

/// Partial update of the settings document.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    /// New title.
    pub site_title: Option<String>,
    /// New tagline; `Some(None)` clears it.
    pub tagline: Option<Option<String>>,
    /// New contact address; `Some(None)` clears it.
    pub contact_email: Option<Option<String>>,
    /// New headline; `Some(None)` clears it.
    pub hero_headline: Option<Option<String>>,
    /// Replacement list of social links.
    pub social_links: Option<Vec<String>>,
    /// Modification timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl SettingsPatch {
    /// An empty patch stamped with the current time.
    pub fn new() -> Self {
        Self {
            updated_at: Some(Utc::now()),
            ..Self::default()
        }
    }
}

const SETTINGS_COLUMNS: &[Column] = &[
    Column::new("id", "id"),
    Column::new("siteTitle", "site_title"),
    Column::new("tagline", "tagline"),
    Column::new("contactEmail", "contact_email"),
    Column::new("heroHeadline", "hero_headline"),
    Column::new("socialLinks", "social_links"),
    Column::new("updatedAt", "updated_at"),
];

impl Record for SiteSettings {
    const COLLECTION: &'static str = "settings";
    const COLUMNS: &'static [Column] = SETTINGS_COLUMNS;

    type Patch = SettingsPatch;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn to_row(&self) -> Row {
        RowBuilder::new()
            .put("id", self.id.as_str())
            .put("site_title", self.site_title.as_str())
            .put_opt("tagline", self.tagline.as_deref())
            .put_opt("contact_email", self.contact_email.as_deref())
            .put_opt("hero_headline", self.hero_headline.as_deref())
            .put("social_links", self.social_links.clone())
            .put_time("updated_at", self.updated_at)
            .build()
    }

    fn from_row(row: &Row) -> AppResult<Self> {
        let r = RowReader::new(row, Self::COLLECTION);
        Ok(Self {
            id: r.string("id")?,
            site_title: r.string("site_title")?,
            tagline: r.opt_string("tagline"),
            contact_email: r.opt_string("contact_email"),
            hero_headline: r.opt_string("hero_headline"),
            social_links: r.string_list("social_links"),
            updated_at: r.timestamp("updated_at")?,
        })
    }

    fn patch_row(patch: &SettingsPatch) -> Row {
        let mut row = RowBuilder::new()
            .put_if("site_title", patch.site_title.as_deref())
            .put_if("social_links", patch.social_links.clone());
        for (column, value) in [
            ("tagline", &patch.tagline),
            ("contact_email", &patch.contact_email),
            ("hero_headline", &patch.hero_headline),
        ] {
            if let Some(value) = value {
                row = row.put_opt(column, value.as_deref());
            }
        }
        if let Some(updated_at) = patch.updated_at {
            row = row.put_time("updated_at", updated_at);
        }
        row.build()
    }
}
