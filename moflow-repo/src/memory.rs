//! In-memory repository adapter backed by a concurrent map.
//!
//! Nothing survives the process; useful for demos and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;

use moflow_types::{
    RepoError, Transaction, TransactionCategory, TransactionId, TransactionRepository,
    TransactionType,
};

pub struct MemoryRepo {
    rows: DashMap<TransactionId, Transaction>,
    changes: watch::Sender<u64>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            rows: DashMap::new(),
            changes,
        }
    }

    fn collect(&self, keep: impl Fn(&Transaction) -> bool) -> Vec<Transaction> {
        let mut out: Vec<Transaction> = self
            .rows
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        // Same order as the SQLite adapter: newest first, then by id.
        out.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        out
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }
}

impl Default for MemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionRepository for MemoryRepo {
    async fn list_transactions(&self) -> Result<Vec<Transaction>, RepoError> {
        Ok(self.collect(|_| true))
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError> {
        Ok(self.rows.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_transactions_by_type(
        &self,
        transaction_type: TransactionType,
    ) -> Result<Vec<Transaction>, RepoError> {
        Ok(self.collect(|tx| tx.transaction_type == transaction_type))
    }

    async fn list_transactions_by_category(
        &self,
        category: TransactionCategory,
    ) -> Result<Vec<Transaction>, RepoError> {
        Ok(self.collect(|tx| tx.category == category))
    }

    async fn list_transactions_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, RepoError> {
        Ok(self.collect(|tx| tx.date >= start && tx.date <= end))
    }

    async fn insert_transaction(&self, tx: &Transaction) -> Result<(), RepoError> {
        self.rows.insert(tx.id, tx.clone());
        tracing::debug!(id = %tx.id, "inserted transaction");
        self.notify();
        Ok(())
    }

    async fn update_transaction(&self, tx: &Transaction) -> Result<(), RepoError> {
        let updated = match self.rows.get_mut(&tx.id) {
            Some(mut entry) => {
                *entry = tx.clone();
                true
            }
            None => false,
        };
        if updated {
            tracing::debug!(id = %tx.id, "updated transaction");
            self.notify();
        }
        Ok(())
    }

    async fn delete_transaction(&self, tx: &Transaction) -> Result<(), RepoError> {
        self.delete_transaction_by_id(tx.id).await
    }

    async fn delete_transaction_by_id(&self, id: TransactionId) -> Result<(), RepoError> {
        if self.rows.remove(&id).is_some() {
            tracing::debug!(%id, "deleted transaction");
            self.notify();
        }
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}
