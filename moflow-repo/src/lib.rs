//! # MoFlow Repository
//!
//! Concrete adapters for the MoFlow ports:
//! - `sqlite` - the on-disk transaction store (`sqlite` feature, default)
//! - `memory` - a process-local transaction store
//! - `currency` - the exchange-rate feed behind `CurrencyRepository`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use moflow_types::{
    RepoError, Transaction, TransactionCategory, TransactionId, TransactionRepository,
    TransactionType,
};

pub mod currency;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
mod types;

#[cfg(feature = "sqlite")]
#[cfg(test)]
mod sqlite_tests;

pub use currency::RemoteCurrencyRepo;
pub use memory::MemoryRepo;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepo;

/// URL selecting the in-memory adapter.
pub const MEMORY_URL: &str = "memory://";

/// Transaction store chosen at runtime from a database URL.
pub enum Repo {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteRepo),
    Memory(MemoryRepo),
}

/// Build and initialize a repository from a database URL.
///
/// # Examples
///
/// ```ignore
/// // SQLite file, created on first use
/// let repo = build_repo("sqlite://moflow.db?mode=rwc").await?;
///
/// // Nothing persisted
/// let repo = build_repo("memory://").await?;
/// ```
pub async fn build_repo(database_url: &str) -> anyhow::Result<Repo> {
    Repo::new(database_url).await
}

impl Repo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        if database_url.starts_with(MEMORY_URL) {
            return Ok(Repo::Memory(MemoryRepo::new()));
        }

        #[cfg(feature = "sqlite")]
        if database_url.starts_with("sqlite:") {
            return Ok(Repo::Sqlite(SqliteRepo::new(database_url).await?));
        }

        anyhow::bail!("Unsupported database URL: {}", database_url)
    }

    fn inner(&self) -> &dyn TransactionRepository {
        match self {
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(repo) => repo,
            Repo::Memory(repo) => repo,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Implement TransactionRepository for Repo (delegation)
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl TransactionRepository for Repo {
    async fn list_transactions(&self) -> Result<Vec<Transaction>, RepoError> {
        self.inner().list_transactions().await
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError> {
        self.inner().get_transaction(id).await
    }

    async fn list_transactions_by_type(
        &self,
        transaction_type: TransactionType,
    ) -> Result<Vec<Transaction>, RepoError> {
        self.inner().list_transactions_by_type(transaction_type).await
    }

    async fn list_transactions_by_category(
        &self,
        category: TransactionCategory,
    ) -> Result<Vec<Transaction>, RepoError> {
        self.inner().list_transactions_by_category(category).await
    }

    async fn list_transactions_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, RepoError> {
        self.inner().list_transactions_by_date_range(start, end).await
    }

    async fn insert_transaction(&self, tx: &Transaction) -> Result<(), RepoError> {
        self.inner().insert_transaction(tx).await
    }

    async fn update_transaction(&self, tx: &Transaction) -> Result<(), RepoError> {
        self.inner().update_transaction(tx).await
    }

    async fn delete_transaction(&self, tx: &Transaction) -> Result<(), RepoError> {
        self.inner().delete_transaction(tx).await
    }

    async fn delete_transaction_by_id(&self, id: TransactionId) -> Result<(), RepoError> {
        self.inner().delete_transaction_by_id(id).await
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner().subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_memory_repo() {
        let repo = build_repo(MEMORY_URL).await.unwrap();
        assert!(matches!(repo, Repo::Memory(_)));
        assert!(repo.list_transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_url() {
        assert!(build_repo("postgres://localhost/moflow").await.is_err());
    }
}
