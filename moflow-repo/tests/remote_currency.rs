//! RemoteCurrencyRepo against a local fake of the exchange-rate API.

use axum::{Json, Router, extract::Path, routing::get};
use moflow_client::ExchangeRateClient;
use moflow_repo::RemoteCurrencyRepo;
use moflow_types::{CurrencyCode, CurrencyRepository, ExchangeError};
use serde_json::json;
use std::time::Duration;

async fn latest(Path((_key, base)): Path<(String, String)>) -> Json<serde_json::Value> {
    let rates = match base.as_str() {
        "EUR" => json!({"EUR": 1.0, "USD": 1.1, "JPY": 165.0}),
        _ => json!({"USD": 1.0, "EUR": 0.9, "JPY": 150.0, "GBP": 0.8}),
    };
    Json(json!({
        "result": "success",
        "time_last_update_unix": 1_700_000_000,
        "base_code": base,
        "conversion_rates": rates
    }))
}

async fn spawn_fake_api() -> String {
    let app = Router::new().route("/{key}/latest/{base}", get(latest));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn code(s: &str) -> CurrencyCode {
    s.parse().unwrap()
}

async fn live_repo() -> RemoteCurrencyRepo {
    let client = ExchangeRateClient::new(spawn_fake_api().await).with_api_key("key");
    RemoteCurrencyRepo::new(client)
}

fn unreachable_repo() -> RemoteCurrencyRepo {
    let client = ExchangeRateClient::new("http://127.0.0.1:1")
        .with_api_key("key")
        .with_timeout(Duration::from_secs(2))
        .unwrap();
    RemoteCurrencyRepo::new(client)
}

#[tokio::test]
async fn test_latest_rates_maps_to_snapshot() {
    let repo = live_repo().await;

    let snapshot = repo.get_latest_exchange_rates(&code("EUR")).await.unwrap();

    assert_eq!(snapshot.base, code("EUR"));
    assert_eq!(snapshot.timestamp, 1_700_000_000);
    assert_eq!(snapshot.rate(&code("JPY")), Some(165.0));
}

#[tokio::test]
async fn test_supported_currencies_from_usd_fetch() {
    let repo = live_repo().await;

    let currencies = repo.get_supported_currencies().await;

    assert_eq!(
        currencies,
        vec![code("EUR"), code("GBP"), code("JPY"), code("USD")]
    );
}

#[tokio::test]
async fn test_supported_currencies_fallback_when_unreachable() {
    let repo = unreachable_repo();

    let currencies: Vec<String> = repo
        .get_supported_currencies()
        .await
        .into_iter()
        .map(String::from)
        .collect();

    assert_eq!(
        currencies,
        vec!["USD", "EUR", "JPY", "GBP", "AUD", "CAD", "CHF", "CNY", "IDR"]
    );
}

#[tokio::test]
async fn test_convert_uses_fresh_rate() {
    let repo = live_repo().await;

    let converted = repo
        .convert_currency(10.0, &code("USD"), &code("EUR"))
        .await
        .unwrap();

    assert!((converted - 9.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_convert_missing_rate_defaults_to_one() {
    let repo = live_repo().await;

    let converted = repo
        .convert_currency(10.0, &code("USD"), &code("IDR"))
        .await
        .unwrap();

    assert_eq!(converted, 10.0);
}

#[tokio::test]
async fn test_convert_unreachable_is_failure() {
    let repo = unreachable_repo();

    let result = repo
        .convert_currency(10.0, &code("USD"), &code("EUR"))
        .await;

    assert!(matches!(result, Err(ExchangeError::ServiceUnavailable(_))));
}
