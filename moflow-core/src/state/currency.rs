//! View-state for the currency converter.

use serde::Serialize;
use tokio::sync::watch;

use exchange_rates::{
    CurrencyCode, ExchangeRate, convert_cached, default_base, default_target, fallback_currencies,
};
use moflow_types::{CurrencyRepository, ExchangeError};

use crate::service::CurrencyService;

pub const DEFAULT_AMOUNT: &str = "1.00";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyState {
    /// Raw amount input, empty or a non-negative decimal
    pub amount: String,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub converted_amount: f64,
    pub rate: f64,
    /// Last successfully fetched snapshot, kept for offline conversion
    pub snapshot: Option<ExchangeRate>,
    pub supported: Vec<CurrencyCode>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Feed timestamp of `snapshot`, unix seconds
    pub last_updated: Option<i64>,
}

impl Default for CurrencyState {
    fn default() -> Self {
        Self {
            amount: DEFAULT_AMOUNT.to_string(),
            from: default_base(),
            to: default_target(),
            converted_amount: 0.0,
            rate: 0.0,
            snapshot: None,
            supported: Vec::new(),
            is_loading: false,
            error: None,
            last_updated: None,
        }
    }
}

/// Accepts empty input or a finite, non-negative decimal.
fn is_valid_amount_input(input: &str) -> bool {
    input.is_empty()
        || input
            .parse::<f64>()
            .is_ok_and(|amount| amount.is_finite() && amount >= 0.0)
}

/// View-state holder for the converter screen.
///
/// Handlers are async and finish their network work before returning. The
/// last fetched snapshot lives here, per instance.
pub struct CurrencyViewModel<C: CurrencyRepository> {
    service: CurrencyService<C>,
    state: watch::Sender<CurrencyState>,
}

impl<C: CurrencyRepository> CurrencyViewModel<C> {
    /// Builds the holder with the default pair; nothing is fetched yet.
    pub fn new(service: CurrencyService<C>) -> Self {
        let (state, _) = watch::channel(CurrencyState::default());
        Self { service, state }
    }

    /// Preselects a pair and amount without touching the network.
    pub fn with_selection(self, from: CurrencyCode, to: CurrencyCode, amount: &str) -> Self {
        self.state.send_modify(|s| {
            s.from = from;
            s.to = to;
            if is_valid_amount_input(amount) {
                s.amount = amount.to_string();
            }
        });
        self
    }

    pub fn state(&self) -> watch::Receiver<CurrencyState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CurrencyState {
        self.state.borrow().clone()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Input events
    // ─────────────────────────────────────────────────────────────────────────────

    /// Fetches rates for the current `from`, then converts.
    ///
    /// On failure the supported list falls back to the fixed set and the
    /// result is recomputed without the feed.
    pub async fn fetch_exchange_rates(&self) {
        let from = self.state.borrow().from.clone();
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.service.get_exchange_rates(&from).await {
            Ok(snapshot) => {
                self.state.send_modify(|s| {
                    s.supported = snapshot.currencies();
                    s.last_updated = Some(snapshot.timestamp);
                    s.snapshot = Some(snapshot);
                    s.is_loading = false;
                });
                self.convert().await;
            }
            Err(e) => {
                tracing::warn!(%from, error = %e, "exchange rate fetch failed");
                self.state.send_modify(|s| {
                    s.error = Some(format!("Failed to fetch exchange rates: {}", e));
                    s.is_loading = false;
                    s.supported = fallback_currencies();
                });
                self.convert_offline();
            }
        }
    }

    /// Takes new amount input. Rejected input leaves the state untouched.
    ///
    /// Returns whether the input was accepted.
    pub async fn set_amount(&self, amount: &str) -> bool {
        if !is_valid_amount_input(amount) {
            return false;
        }
        let amount = amount.to_string();
        self.state.send_modify(|s| s.amount = amount);
        self.convert().await;
        true
    }

    pub async fn set_from(&self, currency: CurrencyCode) {
        if self.state.borrow().from == currency {
            return;
        }
        self.state.send_modify(|s| s.from = currency);
        self.fetch_exchange_rates().await;
    }

    pub async fn set_to(&self, currency: CurrencyCode) {
        if self.state.borrow().to == currency {
            return;
        }
        self.state.send_modify(|s| s.to = currency);
        self.convert().await;
    }

    pub async fn swap(&self) {
        self.state
            .send_modify(|s| std::mem::swap(&mut s.from, &mut s.to));
        self.fetch_exchange_rates().await;
    }

    pub async fn refresh(&self) {
        self.fetch_exchange_rates().await;
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Conversion
    // ─────────────────────────────────────────────────────────────────────────────

    fn selection(&self) -> (f64, CurrencyCode, CurrencyCode) {
        let s = self.state.borrow();
        let amount = s.amount.trim().parse::<f64>().unwrap_or(0.0);
        (amount, s.from.clone(), s.to.clone())
    }

    async fn convert(&self) {
        let (amount, from, to) = self.selection();

        if from == to {
            self.set_result(amount, 1.0);
            return;
        }

        match self.service.convert_currency(amount, &from, &to).await {
            Ok(converted) => {
                let rate = if amount > 0.0 { converted / amount } else { 0.0 };
                self.set_result(converted, rate);
            }
            Err(e) => {
                tracing::warn!(%from, %to, error = %e, "live conversion failed, using cached rates");
                self.convert_from_cache(amount, &from, &to);
            }
        }
    }

    /// Same-currency identity or the cached snapshot; never touches the feed.
    fn convert_offline(&self) {
        let (amount, from, to) = self.selection();
        if from == to {
            self.set_result(amount, 1.0);
        } else {
            self.convert_from_cache(amount, &from, &to);
        }
    }

    fn convert_from_cache(&self, amount: f64, from: &CurrencyCode, to: &CurrencyCode) {
        let Some(snapshot) = self.state.borrow().snapshot.clone() else {
            tracing::warn!(%from, %to, "no cached rates to convert with");
            return;
        };

        match convert_cached(&snapshot, amount, from, to) {
            Ok(conversion) => self.set_result(conversion.converted_amount, conversion.rate),
            Err(missing) => {
                let err = ExchangeError::from(missing);
                self.state.send_modify(|s| {
                    s.error = Some(format!("Conversion calculation error: {}", err));
                });
            }
        }
    }

    fn set_result(&self, converted_amount: f64, rate: f64) {
        self.state.send_modify(|s| {
            s.converted_amount = converted_amount;
            s.rate = rate;
        });
    }
}
