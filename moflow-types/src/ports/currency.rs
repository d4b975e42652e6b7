//! Exchange-rate port.
//!
//! Implementations can be HTTP-backed repositories, fixed-rate fakes, etc.

use exchange_rates::{CurrencyCode, ExchangeRate};

use crate::error::ExchangeError;

/// Port trait for exchange-rate data.
#[async_trait::async_trait]
pub trait CurrencyRepository: Send + Sync + 'static {
    /// Fetches a fresh snapshot of rates relative to `base`.
    async fn get_latest_exchange_rates(
        &self,
        base: &CurrencyCode,
    ) -> Result<ExchangeRate, ExchangeError>;

    /// Currencies known to the feed, or the fallback list when it is unreachable.
    ///
    /// Never fails; each call fetches once and yields one list.
    async fn get_supported_currencies(&self) -> Vec<CurrencyCode>;

    /// Converts `amount` with a fresh fetch for `from`.
    /// A missing rate for `to` counts as 1.0.
    async fn convert_currency(
        &self,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<f64, ExchangeError>;
}
