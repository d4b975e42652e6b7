//! Exchange-rate snapshots and conversion math.
//!
//! This crate knows nothing about HTTP or storage. It models the values a rate
//! feed produces and the arithmetic the app performs with them:
//!
//! - [`CurrencyCode`] - a validated three-letter ISO 4217 style code
//! - [`ExchangeRate`] - an immutable snapshot of multipliers relative to a base
//! - [`CurrencyConversion`] - the derived result of converting an amount
//! - [`convert_cached`] - offline conversion against the last snapshot
//!
//! # Example
//! ```
//! use std::collections::BTreeMap;
//! use exchange_rates::{CurrencyCode, ExchangeRate, convert_cached};
//!
//! let usd: CurrencyCode = "USD".parse().unwrap();
//! let eur: CurrencyCode = "EUR".parse().unwrap();
//! let jpy: CurrencyCode = "JPY".parse().unwrap();
//!
//! let mut rates = BTreeMap::new();
//! rates.insert(eur.clone(), 0.9);
//! rates.insert(jpy.clone(), 150.0);
//! let snapshot = ExchangeRate::new(usd, 1_700_000_000, rates);
//!
//! let conversion = convert_cached(&snapshot, 9.0, &eur, &jpy).unwrap();
//! assert!((conversion.converted_amount - 1500.0).abs() < 1e-9);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Currency codes
// ─────────────────────────────────────────────────────────────────────────────

/// Currencies offered when the rate feed cannot be reached.
pub const FALLBACK_CURRENCIES: [&str; 9] = [
    "USD", "EUR", "JPY", "GBP", "AUD", "CAD", "CHF", "CNY", "IDR",
];

/// Default base currency used to discover the supported currency set.
pub const DEFAULT_BASE: &str = "USD";

/// Default target of a conversion.
pub const DEFAULT_TARGET: &str = "EUR";

/// Error returned when a string is not a three-letter currency code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid currency code: {0:?}")]
pub struct InvalidCurrencyCode(pub String);

/// A three-letter currency code, always stored upper case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(InvalidCurrencyCode(s.to_string()))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// [`DEFAULT_BASE`] as a code.
pub fn default_base() -> CurrencyCode {
    CurrencyCode(DEFAULT_BASE.to_string())
}

/// [`DEFAULT_TARGET`] as a code.
pub fn default_target() -> CurrencyCode {
    CurrencyCode(DEFAULT_TARGET.to_string())
}

/// Returns the fallback currency list as codes.
pub fn fallback_currencies() -> Vec<CurrencyCode> {
    FALLBACK_CURRENCIES
        .iter()
        .map(|code| CurrencyCode(code.to_string()))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// An immutable set of multipliers from `base` to every known currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Currency every multiplier is relative to
    pub base: CurrencyCode,
    /// Unix seconds of the feed's last update
    pub timestamp: i64,
    /// Units of the keyed currency per one unit of `base`
    pub rates: BTreeMap<CurrencyCode, f64>,
}

impl ExchangeRate {
    pub fn new(base: CurrencyCode, timestamp: i64, rates: BTreeMap<CurrencyCode, f64>) -> Self {
        Self {
            base,
            timestamp,
            rates,
        }
    }

    /// Multiplier for `code`, if the snapshot carries one.
    pub fn rate(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Every code in the snapshot plus its base, sorted and without duplicates.
    pub fn currencies(&self) -> Vec<CurrencyCode> {
        let mut codes: Vec<CurrencyCode> = self.rates.keys().cloned().collect();
        if !self.rates.contains_key(&self.base) {
            codes.push(self.base.clone());
            codes.sort();
        }
        codes
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// The result of converting an amount between two currencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConversion {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub amount: f64,
    pub converted_amount: f64,
    /// Effective multiplier applied to `amount`
    pub rate: f64,
}

impl CurrencyConversion {
    /// Builds a conversion by applying `rate` to `amount`.
    pub fn at_rate(from: CurrencyCode, to: CurrencyCode, amount: f64, rate: f64) -> Self {
        Self {
            from,
            to,
            amount,
            converted_amount: amount * rate,
            rate,
        }
    }
}

/// Which relationship between the pair and the snapshot base was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPath {
    /// `from == to`
    Identity,
    /// `from` is the snapshot base
    Direct,
    /// `to` is the snapshot base
    Inverse,
    /// Neither side is the base; goes through it
    Cross,
}

impl ConversionPath {
    /// Picks the branch for converting `from` into `to` with `snapshot`.
    pub fn select(snapshot: &ExchangeRate, from: &CurrencyCode, to: &CurrencyCode) -> Self {
        if from == to {
            ConversionPath::Identity
        } else if *from == snapshot.base {
            ConversionPath::Direct
        } else if *to == snapshot.base {
            ConversionPath::Inverse
        } else {
            ConversionPath::Cross
        }
    }
}

/// The snapshot has no multiplier for a currency the chosen branch needs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Rate not available for {from} -> {to}")]
pub struct MissingRate {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

/// Converts `amount` using only a previously fetched snapshot.
///
/// A multiplier of zero or less on the divisor side yields a rate of 1.0.
/// A multiplier missing from the snapshot is an error rather than a guess.
pub fn convert_cached(
    snapshot: &ExchangeRate,
    amount: f64,
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> Result<CurrencyConversion, MissingRate> {
    let missing = || MissingRate {
        from: from.clone(),
        to: to.clone(),
    };

    let path = ConversionPath::select(snapshot, from, to);
    let rate = match path {
        ConversionPath::Identity => 1.0,
        ConversionPath::Direct => snapshot.rate(to).ok_or_else(missing)?,
        ConversionPath::Inverse => {
            let from_rate = snapshot.rate(from).ok_or_else(missing)?;
            if from_rate > 0.0 { 1.0 / from_rate } else { 1.0 }
        }
        ConversionPath::Cross => {
            let from_rate = snapshot.rate(from).ok_or_else(missing)?;
            let to_rate = snapshot.rate(to).ok_or_else(missing)?;
            if from_rate > 0.0 {
                to_rate / from_rate
            } else {
                1.0
            }
        }
    };

    tracing::debug!(%from, %to, ?path, rate, "converted against cached snapshot");
    Ok(CurrencyConversion::at_rate(
        from.clone(),
        to.clone(),
        amount,
        rate,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    fn usd_snapshot() -> ExchangeRate {
        let mut rates = BTreeMap::new();
        rates.insert(code("USD"), 1.0);
        rates.insert(code("EUR"), 0.9);
        rates.insert(code("JPY"), 150.0);
        rates.insert(code("XXX"), 0.0);
        ExchangeRate::new(code("USD"), 1_700_000_000, rates)
    }

    #[test]
    fn test_currency_code_parse() {
        assert_eq!(code("usd").as_str(), "USD");
        assert_eq!(code(" eur ").to_string(), "EUR");
        assert!("US".parse::<CurrencyCode>().is_err());
        assert!("U5D".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_currency_code_serde() {
        let parsed: CurrencyCode = serde_json::from_str("\"gbp\"").unwrap();
        assert_eq!(parsed, code("GBP"));
        assert!(serde_json::from_str::<CurrencyCode>("\"pounds\"").is_err());
    }

    #[test]
    fn test_fallback_currencies() {
        let codes = fallback_currencies();
        assert_eq!(codes.len(), 9);
        assert_eq!(codes[0], code("USD"));
        assert_eq!(codes[8], code("IDR"));
    }

    #[test]
    fn test_snapshot_currencies_include_base_once() {
        let snapshot = usd_snapshot();
        let codes = snapshot.currencies();
        assert_eq!(codes.iter().filter(|c| c.as_str() == "USD").count(), 1);

        let mut rates = BTreeMap::new();
        rates.insert(code("EUR"), 0.9);
        let without_base = ExchangeRate::new(code("USD"), 0, rates);
        assert_eq!(without_base.currencies(), vec![code("EUR"), code("USD")]);
    }

    #[test]
    fn test_identity_conversion() {
        let snapshot = usd_snapshot();
        let result = convert_cached(&snapshot, 42.5, &code("JPY"), &code("JPY")).unwrap();
        assert_eq!(result.rate, 1.0);
        assert_eq!(result.converted_amount, 42.5);
    }

    #[test]
    fn test_direct_conversion() {
        let snapshot = usd_snapshot();
        let result = convert_cached(&snapshot, 10.0, &code("USD"), &code("EUR")).unwrap();
        assert!((result.converted_amount - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverse_conversion() {
        let snapshot = usd_snapshot();
        let result = convert_cached(&snapshot, 300.0, &code("JPY"), &code("USD")).unwrap();
        assert!((result.rate - 1.0 / 150.0).abs() < 1e-12);
        assert!((result.converted_amount - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_cross_conversion() {
        let snapshot = usd_snapshot();
        let result = convert_cached(&snapshot, 3.0, &code("EUR"), &code("JPY")).unwrap();
        assert!((result.converted_amount - 3.0 * (150.0 / 0.9)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_divisor_defaults_to_one() {
        let snapshot = usd_snapshot();
        let cross = convert_cached(&snapshot, 5.0, &code("XXX"), &code("EUR")).unwrap();
        assert_eq!(cross.rate, 1.0);
        let inverse = convert_cached(&snapshot, 5.0, &code("XXX"), &code("USD")).unwrap();
        assert_eq!(inverse.rate, 1.0);
    }

    #[test]
    fn test_missing_rate_is_flagged() {
        let snapshot = usd_snapshot();
        let err = convert_cached(&snapshot, 1.0, &code("EUR"), &code("IDR")).unwrap_err();
        assert_eq!(err.from, code("EUR"));
        assert_eq!(err.to, code("IDR"));
    }

    #[test]
    fn test_path_selection() {
        let snapshot = usd_snapshot();
        assert_eq!(
            ConversionPath::select(&snapshot, &code("USD"), &code("JPY")),
            ConversionPath::Direct
        );
        assert_eq!(
            ConversionPath::select(&snapshot, &code("EUR"), &code("USD")),
            ConversionPath::Inverse
        );
        assert_eq!(
            ConversionPath::select(&snapshot, &code("EUR"), &code("JPY")),
            ConversionPath::Cross
        );
    }
}
