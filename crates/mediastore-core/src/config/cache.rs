//! Cache layer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Durable store type: `"memory"` or `"file"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Freshness window for cached collections in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of payloads held in the in-memory hot tier.
    #[serde(default = "default_hot_capacity")]
    pub hot_capacity: u64,
    /// Prefix applied to every cache key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// File-backed durable store configuration.
    #[serde(default)]
    pub file: FileCacheConfig,
}

impl CacheConfig {
    /// The configured TTL as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            ttl_seconds: default_ttl(),
            hot_capacity: default_hot_capacity(),
            key_prefix: default_key_prefix(),
            file: FileCacheConfig::default(),
        }
    }
}

/// File-backed durable store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCacheConfig {
    /// Directory holding one file per cache key.
    #[serde(default = "default_directory")]
    pub directory: String,
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_ttl() -> u64 {
    30
}

fn default_hot_capacity() -> u64 {
    256
}

fn default_key_prefix() -> String {
    "mediastore".to_string()
}

fn default_directory() -> String {
    "./data/cache".to_string()
}
