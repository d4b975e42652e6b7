//! Configuration loading from environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use moflow_client::DEFAULT_BASE_URL;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://moflow.db?mode=rwc";
pub const DEFAULT_REPORT_DIR: &str = "MoFlow";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub exchange_api_url: String,
    /// Without a key every rate request fails and the fallbacks apply.
    pub exchange_api_key: Option<String>,
    pub exchange_timeout: Duration,
    pub report_dir: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url =
            lookup("MOFLOW_DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let exchange_api_url =
            lookup("EXCHANGE_RATE_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let exchange_api_key = lookup("EXCHANGE_RATE_API_KEY").filter(|key| !key.trim().is_empty());

        let timeout_secs: u64 = match lookup("EXCHANGE_RATE_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                anyhow::anyhow!("EXCHANGE_RATE_TIMEOUT_SECS must be whole seconds, got {:?}", raw)
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let report_dir = lookup("MOFLOW_REPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR));

        Ok(Self {
            database_url,
            exchange_api_url,
            exchange_api_key,
            exchange_timeout: Duration::from_secs(timeout_secs),
            report_dir,
        })
    }
}
