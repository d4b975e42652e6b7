//! Month/category/type filtering and monthly totals.

use chrono::{DateTime, Datelike, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};

use super::transaction::{Transaction, TransactionCategory, TransactionType};
use crate::error::DomainError;

/// Restricts transactions to one calendar month, or lets all through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthFilter {
    #[default]
    All,
    /// Zero-based month index, 0 = January
    Month(u32),
}

impl MonthFilter {
    /// Builds a filter for a zero-based month index.
    pub fn month(index: u32) -> Result<Self, DomainError> {
        if index > 11 {
            return Err(DomainError::ValidationError(format!(
                "Month index out of range: {}",
                index
            )));
        }
        Ok(MonthFilter::Month(index))
    }

    /// The month containing `now`.
    pub fn containing<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        MonthFilter::Month(now.month0())
    }

    pub fn matches(&self, tx: &Transaction, offset: &FixedOffset) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Month(index) => tx.month_index(offset) == *index,
        }
    }
}

impl std::fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonthFilter::All => write!(f, "all"),
            MonthFilter::Month(index) => write!(f, "{}", index + 1),
        }
    }
}

/// Conjunction of the three optional list filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub month: MonthFilter,
    pub category: Option<TransactionCategory>,
    pub transaction_type: Option<TransactionType>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction, offset: &FixedOffset) -> bool {
        self.month.matches(tx, offset)
            && self.category.is_none_or(|c| tx.category == c)
            && self.transaction_type.is_none_or(|t| tx.transaction_type == t)
    }

    /// Returns the matching transactions, preserving order.
    pub fn apply(&self, transactions: &[Transaction], offset: &FixedOffset) -> Vec<Transaction> {
        transactions
            .iter()
            .filter(|tx| self.matches(tx, offset))
            .cloned()
            .collect()
    }
}

/// Sum of amounts of `transaction_type` within `month`.
pub fn monthly_total(
    transactions: &[Transaction],
    transaction_type: TransactionType,
    month: MonthFilter,
    offset: &FixedOffset,
) -> f64 {
    transactions
        .iter()
        .filter(|tx| tx.transaction_type == transaction_type && month.matches(tx, offset))
        .map(|tx| tx.amount)
        .sum()
}
