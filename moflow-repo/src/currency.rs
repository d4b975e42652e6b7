//! Currency repository backed by the exchange-rate HTTP API.

use async_trait::async_trait;
use exchange_rates::{CurrencyCode, ExchangeRate, default_base, fallback_currencies};
use moflow_client::{ClientError, ExchangeRateClient};
use moflow_types::{CurrencyRepository, ExchangeError};

/// Adapts [`ExchangeRateClient`] to the [`CurrencyRepository`] port.
///
/// Nothing is cached here; every call is one request.
pub struct RemoteCurrencyRepo {
    client: ExchangeRateClient,
}

impl RemoteCurrencyRepo {
    pub fn new(client: ExchangeRateClient) -> Self {
        Self { client }
    }

    async fn fetch(&self, base: &CurrencyCode) -> Result<ExchangeRate, ExchangeError> {
        let dto = self.client.latest_rates(base).await.map_err(to_exchange_error)?;
        dto.into_snapshot().map_err(to_exchange_error)
    }
}

fn to_exchange_error(err: ClientError) -> ExchangeError {
    match err {
        ClientError::Http(e) => ExchangeError::ServiceUnavailable(e.to_string()),
        ClientError::Api { status, message } => {
            ExchangeError::ServiceUnavailable(format!("{} ({})", message, status))
        }
        ClientError::Json(e) => ExchangeError::InvalidResponse(e.to_string()),
        ClientError::InvalidPayload(msg) => ExchangeError::InvalidResponse(msg),
    }
}

#[async_trait]
impl CurrencyRepository for RemoteCurrencyRepo {
    async fn get_latest_exchange_rates(
        &self,
        base: &CurrencyCode,
    ) -> Result<ExchangeRate, ExchangeError> {
        self.fetch(base).await
    }

    async fn get_supported_currencies(&self) -> Vec<CurrencyCode> {
        match self.fetch(&default_base()).await {
            Ok(snapshot) => snapshot.currencies(),
            Err(e) => {
                tracing::warn!(error = %e, "rate feed unavailable, using fallback currency list");
                fallback_currencies()
            }
        }
    }

    async fn convert_currency(
        &self,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<f64, ExchangeError> {
        let snapshot = self.fetch(from).await?;
        let rate = snapshot.rate(to).unwrap_or_else(|| {
            tracing::warn!(%from, %to, "no rate in fresh snapshot, converting at 1.0");
            1.0
        });
        Ok(amount * rate)
    }
}
