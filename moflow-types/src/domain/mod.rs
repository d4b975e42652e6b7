//! Domain models for the finance app.

pub mod filter;
pub mod transaction;

pub use filter::{MonthFilter, TransactionFilter, monthly_total};
pub use transaction::{Transaction, TransactionCategory, TransactionId, TransactionType};
