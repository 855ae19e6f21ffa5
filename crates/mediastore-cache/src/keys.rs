//! Cache key builders for all MediaStore cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses.

/// Key of a cached collection snapshot.
pub fn collection(prefix: &str, collection: &str) -> String {
    format!("{prefix}:collection:{collection}")
}

/// Key of a cached singleton document.
pub fn document(prefix: &str, collection: &str, id: &str) -> String {
    format!("{prefix}:document:{collection}:{id}")
}

/// Freshness timestamp stored beside an entry.
pub fn timestamp(entry_key: &str) -> String {
    format!("{entry_key}:ts")
}

/// Last-known-good snapshot stored beside an entry; survives invalidation.
pub fn last_known_good(entry_key: &str) -> String {
    format!("{entry_key}:lkg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shapes() {
        let key = collection("mediastore", "media");
        assert_eq!(key, "mediastore:collection:media");
        assert_eq!(timestamp(&key), "mediastore:collection:media:ts");
        assert_eq!(last_known_good(&key), "mediastore:collection:media:lkg");
        assert_eq!(
            document("mediastore", "settings", "site"),
            "mediastore:document:settings:site"
        );
    }
}
