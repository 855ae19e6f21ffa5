//! # mediastore-database
//!
//! Implementations of the remote collection backend: PostgreSQL through
//! `sqlx`, and an in-process store for local runs and tests. Also owns the
//! connection pool and the migration runner.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;

use std::sync::Arc;

use tracing::info;

use mediastore_core::config::DatabaseConfig;
use mediastore_core::error::AppError;
use mediastore_core::result::AppResult;
use mediastore_core::traits::backend::CollectionBackend;

pub use connection::DatabasePool;
pub use memory::MemoryCollectionBackend;
pub use postgres::PgCollectionBackend;

/// Create the configured collection backend.
pub async fn connect_backend(config: &DatabaseConfig) -> AppResult<Arc<dyn CollectionBackend>> {
    match config.provider.as_str() {
        "memory" => {
            info!("Using in-process collection backend");
            Ok(Arc::new(MemoryCollectionBackend::new()))
        }
        "postgres" => {
            let pool = DatabasePool::connect(config).await?;
            if config.run_migrations {
                migration::run_migrations(pool.pool()).await?;
            }
            Ok(Arc::new(PgCollectionBackend::new(pool.into_pool())))
        }
        other => Err(AppError::configuration(format!(
            "Unknown database provider: '{other}'. Supported: memory, postgres"
        ))),
    }
}
