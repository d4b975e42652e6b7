//! Transaction repository port.
//!
//! This is the primary storage port in our hexagonal architecture.
//! Adapters (SQLite, InMemory) implement this trait.

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::domain::{Transaction, TransactionCategory, TransactionId, TransactionType};
use crate::error::RepoError;

/// Storage port for transactions.
///
/// Every list is ordered by date, newest first. Writes bump the version
/// published through [`TransactionRepository::subscribe`] once committed, so
/// observers can re-query.
#[async_trait::async_trait]
pub trait TransactionRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────────

    /// Lists all transactions.
    async fn list_transactions(&self) -> Result<Vec<Transaction>, RepoError>;

    /// Gets a transaction by ID.
    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError>;

    async fn list_transactions_by_type(
        &self,
        transaction_type: TransactionType,
    ) -> Result<Vec<Transaction>, RepoError>;

    async fn list_transactions_by_category(
        &self,
        category: TransactionCategory,
    ) -> Result<Vec<Transaction>, RepoError>;

    /// Transactions dated within `start..=end`.
    async fn list_transactions_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────────

    /// Inserts a transaction, replacing any row with the same id.
    async fn insert_transaction(&self, tx: &Transaction) -> Result<(), RepoError>;

    /// Replaces every field of the row with `tx.id`. Missing rows are left alone.
    async fn update_transaction(&self, tx: &Transaction) -> Result<(), RepoError>;

    async fn delete_transaction(&self, tx: &Transaction) -> Result<(), RepoError>;

    async fn delete_transaction_by_id(&self, id: TransactionId) -> Result<(), RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Change notification
    // ─────────────────────────────────────────────────────────────────────────────

    /// Receiver of the store's write counter.
    fn subscribe(&self) -> watch::Receiver<u64>;
}
