//! Integration tests against a local fake of the exchange-rate API.

use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use moflow_client::{ClientError, ExchangeRateClient};
use serde_json::json;
use std::time::Duration;

const API_KEY: &str = "test-key";

async fn latest(Path((key, base)): Path<(String, String)>) -> Response {
    if key != API_KEY {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"result": "error", "error-type": "invalid-key"})),
        )
            .into_response();
    }
    if base == "XYZ" {
        return Json(json!({"result": "error", "error-type": "unsupported-code"})).into_response();
    }
    Json(json!({
        "result": "success",
        "documentation": "https://www.exchangerate-api.com/docs",
        "terms_of_use": "https://www.exchangerate-api.com/terms",
        "time_last_update_unix": 1_700_000_000,
        "time_last_update_utc": "Tue, 14 Nov 2023 00:00:01 +0000",
        "time_next_update_unix": 1_700_086_400,
        "time_next_update_utc": "Wed, 15 Nov 2023 00:00:01 +0000",
        "base_code": base,
        "conversion_rates": {"USD": 1.0, "EUR": 0.9, "JPY": 150.0}
    }))
    .into_response()
}

/// Starts the fake API and returns its base URL.
async fn spawn_fake_api() -> String {
    let app = Router::new().route("/{key}/latest/{base}", get(latest));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_latest_rates_success() {
    let base_url = spawn_fake_api().await;
    let client = ExchangeRateClient::new(base_url)
        .with_api_key(API_KEY)
        .with_timeout(Duration::from_secs(5))
        .unwrap();

    let dto = client.latest_rates(&"EUR".parse().unwrap()).await.unwrap();
    assert_eq!(dto.result, "success");
    assert_eq!(dto.base_code, "EUR");
    assert_eq!(dto.conversion_rates.get("JPY"), Some(&150.0));

    let snapshot = dto.into_snapshot().unwrap();
    assert_eq!(snapshot.base.as_str(), "EUR");
    assert_eq!(snapshot.rates.len(), 3);
}

#[tokio::test]
async fn test_invalid_key_is_api_error() {
    let base_url = spawn_fake_api().await;
    let client = ExchangeRateClient::new(base_url).with_api_key("wrong");

    let err = client
        .latest_rates(&"USD".parse().unwrap())
        .await
        .unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "invalid-key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_result_with_ok_status() {
    let base_url = spawn_fake_api().await;
    let client = ExchangeRateClient::new(base_url).with_api_key(API_KEY);

    let err = client
        .latest_rates(&"XYZ".parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 200, ref message } if message == "unsupported-code"));
}

#[tokio::test]
async fn test_unreachable_host_is_http_error() {
    let client = ExchangeRateClient::new("http://127.0.0.1:1")
        .with_api_key(API_KEY)
        .with_timeout(Duration::from_secs(2))
        .unwrap();

    let err = client
        .latest_rates(&"USD".parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
}

#[tokio::test]
async fn test_stalled_body_is_http_error() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Sends headers and a partial body, then goes quiet.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 512\r\n\r\n{\"result\":")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let client = ExchangeRateClient::new(format!("http://{}", addr))
        .with_api_key(API_KEY)
        .with_timeout(Duration::from_millis(500))
        .unwrap();

    let err = client
        .latest_rates(&"USD".parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
}
