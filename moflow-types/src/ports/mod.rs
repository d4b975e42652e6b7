//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod currency;
mod repository;

pub use currency::CurrencyRepository;
pub use repository::TransactionRepository;
