//! # MoFlow Types
//!
//! Domain types and port traits for the MoFlow personal-finance app.
//! This crate has no IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Transaction, filters)
//! - `ports/` - Trait definitions that adapters must implement
//! - `error/` - Domain, repository, exchange and application error types

pub mod domain;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    MonthFilter, Transaction, TransactionCategory, TransactionFilter, TransactionId,
    TransactionType, monthly_total,
};
pub use error::{AppError, DomainError, ExchangeError, RepoError};
pub use exchange_rates::{CurrencyCode, CurrencyConversion, ExchangeRate};
pub use ports::{CurrencyRepository, TransactionRepository};
