pub mod postgres;
pub mod sqlite;
pub mod trait_def;

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;
pub use trait_def::{LinkStore, StorageError, StorageResult};

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::{DatabaseBackend, DatabaseConfig};

/// Open the configured backend and make sure the schema exists.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn LinkStore>> {
    let store: Arc<dyn LinkStore> = match config.backend {
        DatabaseBackend::Sqlite => Arc::new(
            SqliteStore::new(&config.url, config.max_connections, config.acquire_timeout())
                .await
                .context("failed to open SQLite database")?,
        ),
        DatabaseBackend::Postgres => Arc::new(
            PostgresStore::new(&config.url, config.max_connections, config.acquire_timeout())
                .await
                .context("failed to connect to PostgreSQL")?,
        ),
    };

    store.init().await.context("failed to initialize database schema")?;
    Ok(store)
}
