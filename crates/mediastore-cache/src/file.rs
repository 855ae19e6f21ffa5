//! File-backed durable store: one file per key under a directory.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use mediastore_core::error::{AppError, ErrorKind};
use mediastore_core::result::AppResult;
use mediastore_core::traits::cache::KeyValueStore;

/// Durable store that survives process restarts.
///
/// Keys are escaped into file names so that any key maps to exactly one
/// file. Writes go to a temporary file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    /// Create a store rooted at the given directory. Call
    /// [`KeyValueStore::init`] before first use.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            root: directory.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", escape_key(key)))
    }
}

/// Escape every byte outside `[A-Za-z0-9_-]` as `%XX`.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn unescape_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn storage_error(message: String, err: std::io::Error) -> AppError {
    AppError::with_source(ErrorKind::Cache, message, err)
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    fn store_type(&self) -> &str {
        "file"
    }

    async fn init(&self) -> AppResult<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            storage_error(
                format!("Failed to create cache directory: {}", self.root.display()),
                e,
            )
        })
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(format!("Failed to read cache key: {key}"), e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let target = self.path_for(key);
        let temp = self.root.join(format!(".{}.{}.tmp", escape_key(key), Uuid::new_v4()));

        fs::write(&temp, value)
            .await
            .map_err(|e| storage_error(format!("Failed to write cache key: {key}"), e))?;
        if let Err(e) = fs::rename(&temp, &target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(storage_error(format!("Failed to commit cache key: {key}"), e));
        }

        debug!(key, bytes = value.len(), "Wrote cache file");
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(format!("Failed to delete cache key: {key}"), e)),
        }
    }

    async fn keys(&self, prefix: &str) -> AppResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(storage_error("Failed to list cache directory".into(), e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| storage_error("Failed to list cache directory".into(), e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(stem) = name.strip_suffix(".json") else {
                continue;
            };
            if let Some(key) = unescape_key(stem).filter(|k| k.starts_with(prefix)) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_round_trip() {
        let key = "mediastore:collection:media:ts";
        let escaped = escape_key(key);
        assert_eq!(escaped, "mediastore%3Acollection%3Amedia%3Ats");
        assert_eq!(unescape_key(&escaped).as_deref(), Some(key));
        assert_ne!(escape_key("a:b"), escape_key("a_b"));
    }

    #[tokio::test]
    async fn test_values_survive_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());
        store.init().await.unwrap();
        store.set("ns:media", "[1,2]").await.unwrap();

        let reopened = FileKeyValueStore::new(dir.path());
        assert_eq!(reopened.get("ns:media").await.unwrap().as_deref(), Some("[1,2]"));
        assert_eq!(reopened.keys("ns:").await.unwrap(), ["ns:media"]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("nested"));
        store.init().await.unwrap();
        store.delete("nothing").await.unwrap();
        assert_eq!(store.get("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());
        store.init().await.unwrap();
        store.set("k", "old").await.unwrap();
        store.set("k", "new").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("new"));
        assert_eq!(store.keys("").await.unwrap(), ["k"]);
    }
}
