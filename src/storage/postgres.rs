use crate::models::LinkRecord;
use crate::storage::{LinkStore, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }
}

#[async_trait]
impl LinkStore for PostgresStore {
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS urls (
                id BIGSERIAL PRIMARY KEY,
                original_url TEXT NOT NULL,
                short_code VARCHAR(6) NOT NULL UNIQUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                clicks BIGINT NOT NULL DEFAULT 0,
                last_clicked TIMESTAMPTZ
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

        // btree index rows are capped near 2.7kB, long URLs would not fit
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_original_url ON urls USING HASH (original_url)")
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
            WHERE original_url = $1
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
            WHERE short_code = $1
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
            VALUES ($1, $2, $3, 0)
            ON CONFLICT (short_code) DO NOTHING
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
            SET clicks = clicks + 1, last_clicked = $1
            WHERE short_code = $2
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
