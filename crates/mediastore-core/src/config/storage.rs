//! Blob storage configuration.

use serde::{Deserialize, Serialize};

/// Top-level blob storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Blob store type: `"local"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Path prefix under which media blobs are stored.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Base URL that public blob URLs are built from.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Local filesystem storage configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            key_prefix: default_key_prefix(),
            public_base_url: default_public_base_url(),
            local: LocalStorageConfig::default(),
        }
    }
}

/// Local filesystem storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Root path for local blob storage.
    #[serde(default = "default_local_root")]
    pub root_path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_key_prefix() -> String {
    "media".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080/uploads".to_string()
}

fn default_local_root() -> String {
    "./data/uploads".to_string()
}
