//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field carries a serde default so that an empty
//! configuration is valid.

pub mod cache;
pub mod database;
pub mod logging;
pub mod realtime;
pub mod storage;
pub mod upload;

use serde::{Deserialize, Serialize};

pub use self::cache::{CacheConfig, FileCacheConfig};
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::realtime::RealtimeConfig;
pub use self::storage::{LocalStorageConfig, StorageConfig};
pub use self::upload::{ImageOptimizeConfig, UploadConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (base file + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote backend settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache layer settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Blob storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upload validation and optimization settings.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Change bus settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the base configuration file with an environment-specific
    /// overlay (`config/<env>.toml`) and environment variables prefixed with
    /// `MEDIASTORE__` (e.g. `MEDIASTORE__CACHE__TTL_SECONDS=10`). Missing
    /// files are skipped.
    pub fn load(config_path: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MEDIASTORE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
