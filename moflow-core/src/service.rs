//! Finance and currency application services.
//!
//! Orchestrates domain operations through the repository ports.
//! Contains NO infrastructure logic - pure business orchestration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use exchange_rates::{CurrencyCode, ExchangeRate};
use moflow_types::{
    AppError, CurrencyRepository, DomainError, Transaction, TransactionCategory, TransactionId,
    TransactionRepository, TransactionType,
};

use crate::live::Live;

/// Application service for transaction operations.
///
/// Generic over `R: TransactionRepository` - the adapter is injected at compile time.
/// The repository sits behind an `Arc` so live queries can hold it past the
/// call that created them.
pub struct FinanceService<R: TransactionRepository> {
    repo: Arc<R>,
}

impl<R: TransactionRepository> Clone for FinanceService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: TransactionRepository> FinanceService<R> {
    /// Creates a new finance service with the given repository.
    pub fn new(repo: R) -> Self {
        Self {
            repo: Arc::new(repo),
        }
    }

    pub fn from_shared(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────────

    /// Stores a new transaction.
    pub async fn add_transaction(&self, tx: &Transaction) -> Result<(), AppError> {
        validate(tx)?;
        self.repo.insert_transaction(tx).await?;
        tracing::debug!(id = %tx.id, amount = tx.amount, kind = %tx.transaction_type, "transaction added");
        Ok(())
    }

    /// Replaces every field of an existing transaction.
    ///
    /// Fails with `NotFound` when no record carries `tx.id`.
    pub async fn update_transaction(&self, tx: &Transaction) -> Result<(), AppError> {
        validate(tx)?;
        if self.repo.get_transaction(tx.id).await?.is_none() {
            return Err(AppError::NotFound(format!("Transaction {}", tx.id)));
        }
        self.repo.update_transaction(tx).await?;
        tracing::debug!(id = %tx.id, "transaction updated");
        Ok(())
    }

    pub async fn delete_transaction(&self, tx: &Transaction) -> Result<(), AppError> {
        self.repo.delete_transaction(tx).await?;
        tracing::debug!(id = %tx.id, "transaction deleted");
        Ok(())
    }

    pub async fn delete_transaction_by_id(&self, id: TransactionId) -> Result<(), AppError> {
        self.repo.delete_transaction_by_id(id).await?;
        tracing::debug!(%id, "transaction deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // One-shot reads
    // ─────────────────────────────────────────────────────────────────────────────

    /// Gets a transaction by ID.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, AppError> {
        self.repo
            .get_transaction(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Transaction {}", id))))
    }

    /// Lists all transactions, newest first.
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>, AppError> {
        self.repo.list_transactions().await.map_err(Into::into)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Live reads
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn observe_transactions(&self) -> Live<Vec<Transaction>> {
        let repo = Arc::clone(&self.repo);
        Live::new(self.repo.subscribe(), move || {
            let repo = Arc::clone(&repo);
            async move { repo.list_transactions().await.map_err(AppError::from) }
        })
    }

    /// Follows one record; yields `None` while it does not exist.
    pub fn observe_transaction(&self, id: TransactionId) -> Live<Option<Transaction>> {
        let repo = Arc::clone(&self.repo);
        Live::new(self.repo.subscribe(), move || {
            let repo = Arc::clone(&repo);
            async move { repo.get_transaction(id).await.map_err(AppError::from) }
        })
    }

    pub fn observe_by_type(&self, transaction_type: TransactionType) -> Live<Vec<Transaction>> {
        let repo = Arc::clone(&self.repo);
        Live::new(self.repo.subscribe(), move || {
            let repo = Arc::clone(&repo);
            async move {
                repo.list_transactions_by_type(transaction_type)
                    .await
                    .map_err(AppError::from)
            }
        })
    }

    pub fn observe_by_category(&self, category: TransactionCategory) -> Live<Vec<Transaction>> {
        let repo = Arc::clone(&self.repo);
        Live::new(self.repo.subscribe(), move || {
            let repo = Arc::clone(&repo);
            async move {
                repo.list_transactions_by_category(category)
                    .await
                    .map_err(AppError::from)
            }
        })
    }

    /// Transactions dated within `start..=end`.
    pub fn observe_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Live<Vec<Transaction>> {
        let repo = Arc::clone(&self.repo);
        Live::new(self.repo.subscribe(), move || {
            let repo = Arc::clone(&repo);
            async move {
                repo.list_transactions_by_date_range(start, end)
                    .await
                    .map_err(AppError::from)
            }
        })
    }
}

/// Rejects amounts a caller could have put into the public fields by hand.
fn validate(tx: &Transaction) -> Result<(), DomainError> {
    if !tx.amount.is_finite() {
        return Err(DomainError::InvalidAmount(tx.amount.to_string()));
    }
    if tx.amount < 0.0 {
        return Err(DomainError::NegativeAmount);
    }
    Ok(())
}

/// Application service for exchange rates.
pub struct CurrencyService<C: CurrencyRepository> {
    repo: Arc<C>,
}

impl<C: CurrencyRepository> Clone for CurrencyService<C> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<C: CurrencyRepository> CurrencyService<C> {
    pub fn new(repo: C) -> Self {
        Self {
            repo: Arc::new(repo),
        }
    }

    pub fn repo(&self) -> &C {
        &self.repo
    }

    /// Fetches a fresh snapshot relative to `base`.
    pub async fn get_exchange_rates(&self, base: &CurrencyCode) -> Result<ExchangeRate, AppError> {
        let snapshot = self.repo.get_latest_exchange_rates(base).await?;
        tracing::debug!(%base, rates = snapshot.rates.len(), "exchange rates fetched");
        Ok(snapshot)
    }

    /// Converts `amount` with a fresh fetch for `from`.
    pub async fn convert_currency(
        &self,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<f64, AppError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(DomainError::InvalidAmount(amount.to_string()).into());
        }
        let converted = self.repo.convert_currency(amount, from, to).await?;
        tracing::debug!(%from, %to, amount, converted, "amount converted");
        Ok(converted)
    }

    /// Supported currency codes; never fails.
    pub async fn supported_currencies(&self) -> Vec<CurrencyCode> {
        self.repo.get_supported_currencies().await
    }
}
