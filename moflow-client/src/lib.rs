//! # MoFlow Client
//!
//! A typed Rust client for the exchange-rate API
//! (`GET {base_url}/{api_key}/latest/{base}`).

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use exchange_rates::{CurrencyCode, ExchangeRate};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Public endpoint of the rate feed.
pub const DEFAULT_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// Wire format of a `latest` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRateDto {
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub terms_of_use: Option<String>,
    pub time_last_update_unix: i64,
    #[serde(default)]
    pub time_last_update_utc: Option<String>,
    #[serde(default)]
    pub time_next_update_unix: Option<i64>,
    #[serde(default)]
    pub time_next_update_utc: Option<String>,
    pub base_code: String,
    pub conversion_rates: HashMap<String, f64>,
}

impl ExchangeRateDto {
    /// Converts the payload into a domain snapshot.
    ///
    /// Rate keys that are not currency codes are dropped.
    pub fn into_snapshot(self) -> Result<ExchangeRate, ClientError> {
        let base: CurrencyCode = self
            .base_code
            .parse()
            .map_err(|e: exchange_rates::InvalidCurrencyCode| {
                ClientError::InvalidPayload(e.to_string())
            })?;

        let mut rates = BTreeMap::new();
        for (code, rate) in self.conversion_rates {
            match code.parse::<CurrencyCode>() {
                Ok(code) => {
                    rates.insert(code, rate);
                }
                Err(e) => tracing::warn!(error = %e, "skipping unknown rate key"),
            }
        }

        Ok(ExchangeRate::new(base, self.time_last_update_unix, rates))
    }
}

/// Exchange-rate API client.
pub struct ExchangeRateClient {
    base_url: String,
    api_key: Option<String>,
    http: Client,
}

impl ExchangeRateClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            http: Client::new(),
        }
    }

    /// Sets the API key embedded in the request path.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Replaces the HTTP client with one that gives up after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ClientError> {
        self.http = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Fetches the latest rates relative to `base`.
    pub async fn latest_rates(&self, base: &CurrencyCode) -> Result<ExchangeRateDto, ClientError> {
        tracing::debug!(%base, "fetching latest exchange rates");
        let resp = self.http.get(self.latest_url(base)).send().await?;
        self.handle_response(resp).await
    }

    fn latest_url(&self, base: &CurrencyCode) -> String {
        match &self.api_key {
            Some(key) => format!("{}/{}/latest/{}", self.base_url, key, base),
            None => format!("{}/latest/{}", self.base_url, base),
        }
    }

    async fn handle_response(
        &self,
        resp: reqwest::Response,
    ) -> Result<ExchangeRateDto, ClientError> {
        let status = resp.status();

        if status.is_success() {
            let body = resp.text().await?;
            let value: serde_json::Value = serde_json::from_str(&body)?;
            if let Some(message) = api_error_type(&value) {
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
            Ok(serde_json::from_value(value)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| api_error_type(&v))
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// The feed reports failures as `{"result": "error", "error-type": "..."}`.
fn api_error_type(value: &serde_json::Value) -> Option<String> {
    if value.get("result").and_then(|r| r.as_str()) != Some("error") {
        return None;
    }
    Some(
        value
            .get("error-type")
            .and_then(|e| e.as_str())
            .unwrap_or("unknown-error")
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    #[test]
    fn test_client_with_trailing_slash() {
        let client = ExchangeRateClient::new("http://localhost:3000/");
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_latest_url_embeds_key() {
        let client = ExchangeRateClient::new(DEFAULT_BASE_URL).with_api_key("abc123");
        assert_eq!(
            client.latest_url(&code("USD")),
            "https://v6.exchangerate-api.com/v6/abc123/latest/USD"
        );
    }

    #[test]
    fn test_latest_url_without_key() {
        let client = ExchangeRateClient::new("http://localhost:3000");
        assert_eq!(
            client.latest_url(&code("eur")),
            "http://localhost:3000/latest/EUR"
        );
    }

    #[test]
    fn test_dto_into_snapshot() {
        let json = r#"{
            "result": "success",
            "time_last_update_unix": 1700000000,
            "base_code": "USD",
            "conversion_rates": {"USD": 1, "EUR": 0.9, "JPY": 150.25, "??": 3}
        }"#;
        let dto: ExchangeRateDto = serde_json::from_str(json).unwrap();
        let snapshot = dto.into_snapshot().unwrap();

        assert_eq!(snapshot.base, code("USD"));
        assert_eq!(snapshot.timestamp, 1_700_000_000);
        assert_eq!(snapshot.rates.len(), 3);
        assert_eq!(snapshot.rate(&code("JPY")), Some(150.25));
    }

    #[test]
    fn test_dto_with_bad_base_is_rejected() {
        let dto = ExchangeRateDto {
            result: "success".into(),
            documentation: None,
            terms_of_use: None,
            time_last_update_unix: 0,
            time_last_update_utc: None,
            time_next_update_unix: None,
            time_next_update_utc: None,
            base_code: "dollars".into(),
            conversion_rates: HashMap::new(),
        };
        assert!(matches!(
            dto.into_snapshot(),
            Err(ClientError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_api_error_type() {
        let value = serde_json::json!({"result": "error", "error-type": "invalid-key"});
        assert_eq!(api_error_type(&value), Some("invalid-key".to_string()));
        let ok = serde_json::json!({"result": "success"});
        assert_eq!(api_error_type(&ok), None);
    }
}
