use crate::models::LinkRecord;
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    DuplicateCode,
    #[error("no database connection available before the acquire timeout")]
    PoolExhausted,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StorageError::PoolExhausted,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StorageError::DuplicateCode,
            other => StorageError::Other(other.into()),
        }
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Owns every read and write against the `urls` table.
///
/// Implementations hold a bounded connection pool. Each call acquires one
/// connection for its duration and hands it back when the call returns,
/// whatever the outcome.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Initialize the storage (create table and indexes)
    async fn init(&self) -> Result<()>;

    /// Look up a record by its original URL (exact match after trimming)
    async fn find_by_url(&self, original_url: &str) -> StorageResult<Option<LinkRecord>>;

    /// Look up a record by its short code (exact match)
    async fn find_by_code(&self, short_code: &str) -> StorageResult<Option<LinkRecord>>;

    /// Insert a new record.
    ///
    /// Fails with [`StorageError::DuplicateCode`] when another record already
    /// owns `short_code`, including one inserted concurrently.
    async fn create(&self, original_url: &str, short_code: &str) -> StorageResult<LinkRecord>;

    /// Atomically bump `clicks` and stamp `last_clicked`.
    ///
    /// Returns false when no record has this code.
    async fn record_click(&self, short_code: &str) -> StorageResult<bool>;

    /// Round-trip a trivial query to check connectivity
    async fn ping(&self) -> StorageResult<()>;
}
