//! Transaction domain model.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Unique identifier for a Transaction.
///
/// Ordering matches the lexical order of the hyphenated text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a new random TransactionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a TransactionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Direction of money relative to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Stored name of the variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENSE" => Ok(TransactionType::Expense),
            _ => Err(DomainError::ValidationError(format!(
                "Unknown transaction type: {}",
                s
            ))),
        }
    }
}

/// Closed set of spending/earning categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionCategory {
    Food,
    Transport,
    Entertainment,
    Salary,
    Gift,
    Other,
}

impl TransactionCategory {
    pub fn all() -> &'static [TransactionCategory] {
        &[
            TransactionCategory::Food,
            TransactionCategory::Transport,
            TransactionCategory::Entertainment,
            TransactionCategory::Salary,
            TransactionCategory::Gift,
            TransactionCategory::Other,
        ]
    }

    /// Stored name of the variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionCategory::Food => "FOOD",
            TransactionCategory::Transport => "TRANSPORT",
            TransactionCategory::Entertainment => "ENTERTAINMENT",
            TransactionCategory::Salary => "SALARY",
            TransactionCategory::Gift => "GIFT",
            TransactionCategory::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        TransactionCategory::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| DomainError::ValidationError(format!("Unknown category: {}", s)))
    }
}

/// A recorded income or expense.
///
/// The id never changes; an update replaces every other field at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,
    /// Non-negative amount
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: TransactionCategory,
    /// When the money moved
    pub date: DateTime<Utc>,
    /// Free text, may be empty
    pub notes: String,
}

impl Transaction {
    /// Creates a new transaction with a freshly generated id.
    pub fn new(
        amount: f64,
        transaction_type: TransactionType,
        category: TransactionCategory,
        date: DateTime<Utc>,
        notes: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Self::with_id(
            TransactionId::new(),
            amount,
            transaction_type,
            category,
            date,
            notes,
        )
    }

    /// Creates a validated transaction that keeps an existing id.
    pub fn with_id(
        id: TransactionId,
        amount: f64,
        transaction_type: TransactionType,
        category: TransactionCategory,
        date: DateTime<Utc>,
        notes: impl Into<String>,
    ) -> Result<Self, DomainError> {
        validate_amount(amount)?;
        Ok(Self::from_parts(
            id,
            amount,
            transaction_type,
            category,
            date,
            notes.into(),
        ))
    }

    /// Reconstructs a transaction from stored fields.
    pub fn from_parts(
        id: TransactionId,
        amount: f64,
        transaction_type: TransactionType,
        category: TransactionCategory,
        date: DateTime<Utc>,
        notes: String,
    ) -> Self {
        Self {
            id,
            amount,
            transaction_type,
            category,
            date,
            notes,
        }
    }

    /// Zero-based calendar month of `date` as seen at `offset`.
    pub fn month_index(&self, offset: &FixedOffset) -> u32 {
        self.date.with_timezone(offset).month0()
    }
}

fn validate_amount(amount: f64) -> Result<(), DomainError> {
    if !amount.is_finite() {
        return Err(DomainError::InvalidAmount(amount.to_string()));
    }
    if amount < 0.0 {
        return Err(DomainError::NegativeAmount);
    }
    Ok(())
}
