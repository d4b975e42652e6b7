//! Error types for the finance app.

use exchange_rates::{CurrencyCode, MissingRate};

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),
}

/// Errors from fetching or applying exchange rates.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate not available for {0} -> {1}")]
    RateNotAvailable(CurrencyCode, CurrencyCode),
}

impl From<MissingRate> for ExchangeError {
    fn from(err: MissingRate) -> Self {
        ExchangeError::RateNotAvailable(err.from, err.to)
    }
}

/// Application-level errors, as surfaced to view-state and the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => AppError::BadRequest(e.to_string()),
            RepoError::Database(e) => AppError::Storage(e),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_error_maps_to_storage() {
        let err: AppError = RepoError::Database("disk full".into()).into();
        assert!(matches!(err, AppError::Storage(ref m) if m == "disk full"));
    }

    #[test]
    fn test_missing_rate_maps_to_exchange_error() {
        let missing = MissingRate {
            from: "EUR".parse().unwrap(),
            to: "IDR".parse().unwrap(),
        };
        let err: ExchangeError = missing.into();
        assert_eq!(err.to_string(), "Rate not available for EUR -> IDR");
    }
}
