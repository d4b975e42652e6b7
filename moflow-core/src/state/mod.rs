//! View-state holders, one per screen.
//!
//! Each holder publishes its state through a `watch` channel and reacts to
//! input events. Holders that follow the store own their background task and
//! abort it when dropped.

pub mod currency;
pub mod finance;
pub mod home;

pub use currency::{CurrencyState, CurrencyViewModel};
pub use finance::{EditorMode, FinanceState, FinanceViewModel, TransactionForm};
pub use home::{HomeState, HomeViewModel};
