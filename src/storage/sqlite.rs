use crate::models::LinkRecord;
use crate::storage::{LinkStore, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

pub struct SqliteStore {
    pool: Arc<SqlitePool>,
}

impl SqliteStore {
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        self.pool.as_ref()
    }
}

#[async_trait]
impl LinkStore for SqliteStore {
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS urls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                original_url TEXT NOT NULL,
                short_code TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                clicks INTEGER NOT NULL DEFAULT 0,
                last_clicked TEXT
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_short_code ON urls(short_code)")
            .execute(&mut *conn)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_created_at ON urls(created_at)")
            .execute(&mut *conn)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_original_url ON urls(original_url)")
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    async fn find_by_url(&self, original_url: &str) -> StorageResult<Option<LinkRecord>> {
        let mut conn = self.pool.acquire().await?;

        let record = sqlx::query_as::<_, LinkRecord>(
            r#"
            SELECT id, original_url, short_code, created_at, clicks, last_clicked
            FROM urls
            WHERE original_url = ?
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(original_url.trim())
        .fetch_optional(&mut *conn)
        .await?;

        Ok(record)
    }

    async fn find_by_code(&self, short_code: &str) -> StorageResult<Option<LinkRecord>> {
        let mut conn = self.pool.acquire().await?;

        let record = sqlx::query_as::<_, LinkRecord>(
            r#"
            SELECT id, original_url, short_code, created_at, clicks, last_clicked
            FROM urls
            WHERE short_code = ?
            "#,
        )
        .bind(short_code)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(record)
    }

    async fn create(&self, original_url: &str, short_code: &str) -> StorageResult<LinkRecord> {
        let mut conn = self.pool.acquire().await?;

        let record = sqlx::query_as::<_, LinkRecord>(
            r#"
            INSERT INTO urls (original_url, short_code, created_at, clicks)
            VALUES (?, ?, ?, 0)
            ON CONFLICT(short_code) DO NOTHING
            RETURNING id, original_url, short_code, created_at, clicks, last_clicked
            "#,
        )
        .bind(original_url)
        .bind(short_code)
        .bind(Utc::now())
        .fetch_optional(&mut *conn)
        .await?;

        record.ok_or(StorageError::DuplicateCode)
    }

    async fn record_click(&self, short_code: &str) -> StorageResult<bool> {
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query(
            r#"
            UPDATE urls
            SET clicks = clicks + 1, last_clicked = ?
            WHERE short_code = ?
            "#,
        )
        .bind(Utc::now())
        .bind(short_code)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> StorageResult<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup(max_connections: u32) -> SqliteStore {
        let store = SqliteStore::new("sqlite::memory:", max_connections, Duration::from_millis(200))
            .await
            .unwrap();
        store.init().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let store = setup(2).await;
        store.init().await.unwrap();
        store.create("https://example.com", "abc123").await.unwrap();
        store.init().await.unwrap();
        assert!(store.find_by_code("abc123").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_sets_initial_state() {
        let store = setup(2).await;
        let before = Utc::now();

        let record = store.create("https://example.com/page", "aB3xZ9").await.unwrap();

        assert!(record.id > 0);
        assert_eq!(record.original_url, "https://example.com/page");
        assert_eq!(record.short_code, "aB3xZ9");
        assert_eq!(record.clicks, 0);
        assert!(record.last_clicked.is_none());
        assert!(record.created_at >= before - chrono::Duration::seconds(1));
    }

    #[tokio::test]
    async fn test_create_duplicate_code() {
        let store = setup(2).await;
        store.create("https://example.com/1", "dupdup").await.unwrap();

        let err = store.create("https://example.com/2", "dupdup").await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateCode));

        // The losing insert left nothing behind
        let record = store.find_by_code("dupdup").await.unwrap().unwrap();
        assert_eq!(record.original_url, "https://example.com/1");
        assert!(store.find_by_url("https://example.com/2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_codes_are_case_sensitive() {
        let store = setup(2).await;
        store.create("https://example.com/lower", "abcdef").await.unwrap();
        store.create("https://example.com/upper", "ABCDEF").await.unwrap();

        let lower = store.find_by_code("abcdef").await.unwrap().unwrap();
        let upper = store.find_by_code("ABCDEF").await.unwrap().unwrap();
        assert_eq!(lower.original_url, "https://example.com/lower");
        assert_eq!(upper.original_url, "https://example.com/upper");
    }

    #[tokio::test]
    async fn test_find_by_url_trims_only() {
        let store = setup(2).await;
        store.create("https://example.com/a", "trim01").await.unwrap();

        let hit = store.find_by_url("  https://example.com/a\n").await.unwrap();
        assert_eq!(hit.unwrap().short_code, "trim01");

        assert!(store.find_by_url("https://example.com/a/").await.unwrap().is_none());
        assert!(store.find_by_url("HTTPS://EXAMPLE.COM/a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_click_updates_counter_and_timestamp() {
        let store = setup(2).await;
        store.create("https://example.com", "click1").await.unwrap();

        for _ in 0..3 {
            assert!(store.record_click("click1").await.unwrap());
        }

        let record = store.find_by_code("click1").await.unwrap().unwrap();
        assert_eq!(record.clicks, 3);
        assert!(record.last_clicked.is_some());
        assert!(record.last_clicked.unwrap() >= record.created_at);
    }

    #[tokio::test]
    async fn test_record_click_missing_code() {
        let store = setup(2).await;
        assert!(!store.record_click("nope00").await.unwrap());
        assert!(store.find_by_code("nope00").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pool_exhaustion_fails_fast() {
        let store = setup(1).await;
        let held = store.pool().acquire().await.unwrap();

        let err = store.find_by_code("abc123").await.unwrap_err();
        assert!(matches!(err, StorageError::PoolExhausted));
        let err = store.ping().await.unwrap_err();
        assert!(matches!(err, StorageError::PoolExhausted));

        drop(held);
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_released_after_failure() {
        let store = setup(1).await;
        store.create("https://example.com", "same00").await.unwrap();

        for _ in 0..5 {
            let err = store.create("https://example.org", "same00").await.unwrap_err();
            assert!(matches!(err, StorageError::DuplicateCode));
        }

        // A single-connection pool still serves requests
        store.ping().await.unwrap();
        assert!(store.record_click("same00").await.unwrap());
    }
}
