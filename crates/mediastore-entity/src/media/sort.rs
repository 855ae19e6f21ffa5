//! Ordering of folder listings.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use mediastore_core::error::AppError;
use mediastore_core::types::SortDirection;

use super::model::MediaItem;

/// Caller-selectable listing order. Folders always precede files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSortKey {
    /// Case-insensitive name.
    #[default]
    Name,
    /// Last update time.
    Updated,
    /// Creation time.
    Created,
    /// Item kind, then name.
    Kind,
}

impl FromStr for MediaSortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "updated" | "date" => Ok(Self::Updated),
            "created" => Ok(Self::Created),
            "kind" | "type" => Ok(Self::Kind),
            other => Err(AppError::validation(format!("Unknown sort key: '{other}'"))),
        }
    }
}

fn by_name(a: &MediaItem, b: &MediaItem) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

/// Sort a listing: folders first, then by `key` in `direction`.
pub fn sort_items(items: &mut [MediaItem], key: MediaSortKey, direction: SortDirection) {
    items.sort_by(|a, b| {
        let folders_first = b.is_folder().cmp(&a.is_folder());
        let keyed = match key {
            MediaSortKey::Name => by_name(a, b),
            MediaSortKey::Updated => a.updated_at.cmp(&b.updated_at),
            MediaSortKey::Created => a.created_at.cmp(&b.created_at),
            MediaSortKey::Kind => a.kind.cmp(&b.kind).then_with(|| by_name(a, b)),
        };
        folders_first
            .then(direction.apply(keyed))
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::media::model::BlobInfo;
    use mediastore_core::types::ItemId;

    fn file(name: &str, mime: &str) -> MediaItem {
        MediaItem::file(
            ItemId::new(),
            name,
            None,
            BlobInfo {
                url: String::new(),
                size_bytes: 1,
                storage_key: String::new(),
                mime_type: mime.into(),
            },
        )
    }

    fn names(items: &[MediaItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_folders_first_then_name() {
        let mut items = vec![
            file("beta.png", "image/png"),
            MediaItem::folder("zeta", None),
            file("Alpha.mp4", "video/mp4"),
            MediaItem::folder("Archive", None),
        ];
        sort_items(&mut items, MediaSortKey::Name, SortDirection::Asc);
        assert_eq!(names(&items), ["Archive", "zeta", "Alpha.mp4", "beta.png"]);

        sort_items(&mut items, MediaSortKey::Name, SortDirection::Desc);
        assert_eq!(names(&items), ["zeta", "Archive", "beta.png", "Alpha.mp4"]);
    }

    #[test]
    fn test_sort_by_updated() {
        let mut older = file("older.txt", "text/plain");
        older.updated_at -= Duration::hours(1);
        let newer = file("newer.txt", "text/plain");
        let mut items = vec![newer, older];
        sort_items(&mut items, MediaSortKey::Updated, SortDirection::Asc);
        assert_eq!(names(&items), ["older.txt", "newer.txt"]);
    }

    #[test]
    fn test_sort_by_kind() {
        let mut items = vec![
            file("b.pdf", "application/pdf"),
            file("c.mp4", "video/mp4"),
            file("a.png", "image/png"),
        ];
        sort_items(&mut items, MediaSortKey::Kind, SortDirection::Asc);
        assert_eq!(names(&items), ["a.png", "c.mp4", "b.pdf"]);
    }

    #[test]
    fn test_parse_sort_key() {
        assert_eq!("date".parse::<MediaSortKey>().unwrap(), MediaSortKey::Updated);
        assert!("size".parse::<MediaSortKey>().is_err());
    }
}
