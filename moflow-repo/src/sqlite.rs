//! SQLite repository adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tokio::sync::watch;

use moflow_types::{
    RepoError, Transaction, TransactionCategory, TransactionId, TransactionRepository,
    TransactionType,
};

use crate::types::DbTransaction;

const MIGRATION: &str = include_str!("../migrations/0001_create_transactions.sql");

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
    changes: watch::Sender<u64>,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        // Ensure on-disk SQLite target directory exists.
        if !in_memory {
            if let Some(path) = database_url.strip_prefix("sqlite://") {
                let path = path.split('?').next().unwrap_or(path);
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to `:memory:` is its own database, so pin to one.
        let mut pool_options = SqlitePoolOptions::new();
        if in_memory {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        let repo = Self::from_pool(pool);
        repo.create_schema().await?;
        tracing::debug!(database_url, "sqlite repository ready");
        Ok(repo)
    }

    /// Wraps an existing pool without running migrations.
    pub fn from_pool(pool: SqlitePool) -> Self {
        let (changes, _) = watch::channel(0);
        Self { pool, changes }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema.
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        sqlx::raw_sql(MIGRATION)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;
        Ok(())
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl TransactionRepository for SqliteRepo {
    async fn list_transactions(&self) -> Result<Vec<Transaction>, RepoError> {
        let rows: Vec<DbTransaction> = sqlx::query_as(
            r#"SELECT id, amount, type, category, date, notes FROM transactions ORDER BY date DESC, id"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError> {
        let id_str = id.to_string();

        let row: Option<DbTransaction> = sqlx::query_as(
            r#"SELECT id, amount, type, category, date, notes FROM transactions WHERE id = ?"#,
        )
        .bind(&id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbTransaction::into_domain).transpose()
    }

    async fn list_transactions_by_type(
        &self,
        transaction_type: TransactionType,
    ) -> Result<Vec<Transaction>, RepoError> {
        let rows: Vec<DbTransaction> = sqlx::query_as(
            r#"SELECT id, amount, type, category, date, notes FROM transactions
               WHERE type = ? ORDER BY date DESC, id"#,
        )
        .bind(transaction_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }

    async fn list_transactions_by_category(
        &self,
        category: TransactionCategory,
    ) -> Result<Vec<Transaction>, RepoError> {
        let rows: Vec<DbTransaction> = sqlx::query_as(
            r#"SELECT id, amount, type, category, date, notes FROM transactions
               WHERE category = ? ORDER BY date DESC, id"#,
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }

    async fn list_transactions_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, RepoError> {
        let rows: Vec<DbTransaction> = sqlx::query_as(
            r#"SELECT id, amount, type, category, date, notes FROM transactions
               WHERE date BETWEEN ? AND ? ORDER BY date DESC, id"#,
        )
        .bind(start.timestamp_millis())
        .bind(end.timestamp_millis())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }

    async fn insert_transaction(&self, tx: &Transaction) -> Result<(), RepoError> {
        let row = DbTransaction::from_domain(tx);

        sqlx::query(
            r#"INSERT OR REPLACE INTO transactions (id, amount, type, category, date, notes)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&row.id)
        .bind(row.amount)
        .bind(&row.kind)
        .bind(&row.category)
        .bind(row.date)
        .bind(&row.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        tracing::debug!(id = %tx.id, "inserted transaction");
        self.notify();
        Ok(())
    }

    async fn update_transaction(&self, tx: &Transaction) -> Result<(), RepoError> {
        let row = DbTransaction::from_domain(tx);

        let result = sqlx::query(
            r#"UPDATE transactions SET amount = ?, type = ?, category = ?, date = ?, notes = ?
               WHERE id = ?"#,
        )
        .bind(row.amount)
        .bind(&row.kind)
        .bind(&row.category)
        .bind(row.date)
        .bind(&row.notes)
        .bind(&row.id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() > 0 {
            tracing::debug!(id = %tx.id, "updated transaction");
            self.notify();
        }
        Ok(())
    }

    async fn delete_transaction(&self, tx: &Transaction) -> Result<(), RepoError> {
        self.delete_transaction_by_id(tx.id).await
    }

    async fn delete_transaction_by_id(&self, id: TransactionId) -> Result<(), RepoError> {
        let result = sqlx::query(r#"DELETE FROM transactions WHERE id = ?"#)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() > 0 {
            tracing::debug!(%id, "deleted transaction");
            self.notify();
        }
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}
