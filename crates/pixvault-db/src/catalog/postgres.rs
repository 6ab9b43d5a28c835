//! Postgres catalog store: CRUD for the catalog_entries table.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use pixvault_core::{AppError, CatalogEntry};
use sqlx::{PgPool, Postgres};

use super::CatalogStore;

/// Repository for the catalog_entries table.
#[derive(Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresCatalogStore {
    /// `timeout` bounds every individual query, including pool acquisition.
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        self.timed(operation, fut).await?.map_err(AppError::from)
    }

    /// Runs `fut` under the store timeout. Only expiry is mapped here; the
    /// query's own error is returned untouched for the caller to inspect.
    async fn timed<T, F>(
        &self,
        operation: &'static str,
        fut: F,
    ) -> Result<Result<T, sqlx::Error>, AppError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        tokio::time::timeout(self.timeout, fut).await.map_err(|_| {
            tracing::warn!(
                operation,
                timeout_ms = self.timeout.as_millis() as u64,
                "Catalog operation timed out"
            );
            AppError::StoreUnavailable(format!("{} timed out after {:?}", operation, self.timeout))
        })
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[tracing::instrument(skip(self), fields(db.table = "catalog_entries", db.operation = "select"))]
    async fn lookup(&self, identity_key: &str) -> Result<Option<String>, AppError> {
        self.bounded(
            "lookup",
            sqlx::query_scalar::<Postgres, String>(
                "SELECT remote_url FROM catalog_entries WHERE identity_key = $1",
            )
            .bind(identity_key)
            .fetch_optional(&self.pool),
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "catalog_entries", db.operation = "upsert"))]
    async fn upsert(&self, identity_key: &str, remote_url: &str) -> Result<(), AppError> {
        let result = self
            .timed(
                "upsert",
                sqlx::query(
                    r#"
                    INSERT INTO catalog_entries (identity_key, remote_url)
                    VALUES ($1, $2)
                    ON CONFLICT (identity_key) DO UPDATE
                    SET remote_url = EXCLUDED.remote_url, updated_at = NOW()
                    WHERE catalog_entries.remote_url IS DISTINCT FROM EXCLUDED.remote_url
                    "#,
                )
                .bind(identity_key)
                .bind(remote_url)
                .execute(&self.pool),
            )
            .await?;

        match result {
            Ok(done) => {
                tracing::debug!(rows_affected = done.rows_affected(), "Catalog entry upserted");
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => {
                tracing::info!(
                    identity_key,
                    "Concurrent insert won the race for identity key"
                );
                Ok(())
            }
            Err(e) => Err(AppError::from(e)),
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "catalog_entries", db.operation = "select"))]
    async fn get(&self, identity_key: &str) -> Result<Option<CatalogEntry>, AppError> {
        self.bounded(
            "get",
            sqlx::query_as::<Postgres, CatalogEntry>(
                r#"
                SELECT identity_key, remote_url, created_at, updated_at
                FROM catalog_entries
                WHERE identity_key = $1
                "#,
            )
            .bind(identity_key)
            .fetch_optional(&self.pool),
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "catalog_entries", db.operation = "count"))]
    async fn count(&self) -> Result<u64, AppError> {
        let count: i64 = self
            .bounded(
                "count",
                sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM catalog_entries")
                    .fetch_one(&self.pool),
            )
            .await?;
        Ok(count.max(0) as u64)
    }
}
