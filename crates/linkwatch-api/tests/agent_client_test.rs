#![allow(clippy::unwrap_used)]
// Integration tests for `AgentClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use linkwatch_api::{AgentClient, Error, TransportConfig};

async fn setup_with_timeout(timeout: Duration) -> (MockServer, AgentClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/", server.uri())).unwrap();
    let transport = TransportConfig {
        timeout,
        ..TransportConfig::default()
    };
    let client = AgentClient::with_client(transport.build_client().unwrap(), base_url, timeout);
    (server, client)
}

async fn setup() -> (MockServer, AgentClient) {
    setup_with_timeout(Duration::from_secs(5)).await
}

#[tokio::test]
async fn test_read_counters_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/counters"))
        .and(body_json(json!({ "counters": ["1.3.6.1.1", "1.3.6.1.2"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": { "1.3.6.1.1": 1000, "1.3.6.1.2": null }
        })))
        .mount(&server)
        .await;

    let ids = vec!["1.3.6.1.1".to_string(), "1.3.6.1.2".to_string()];
    let readings = client.read_counters(&ids).await.unwrap();

    assert_eq!(readings.get("1.3.6.1.1"), Some(&Some(1000)));
    assert_eq!(readings.get("1.3.6.1.2"), Some(&None));
}

#[tokio::test]
async fn test_missing_keys_are_filled_with_none() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/counters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "values": {} })))
        .mount(&server)
        .await;

    let ids = vec!["1.3.6.1.9".to_string()];
    let readings = client.read_counters(&ids).await.unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings.get("1.3.6.1.9"), Some(&None));
}

#[tokio::test]
async fn test_agent_error_status() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/counters"))
        .respond_with(ResponseTemplate::new(503).set_body_string("device unreachable"))
        .mount(&server)
        .await;

    let err = client
        .read_counters(&["1.3.6.1.1".to_string()])
        .await
        .unwrap_err();
    assert!(err.is_transient());
    match err {
        Error::Agent { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "device unreachable");
        }
        other => panic!("expected Agent error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/counters"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client.read_counters(&["1.3.6.1.1".to_string()]).await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_timeout_reports_configured_limit() {
    let (server, client) = setup_with_timeout(Duration::from_millis(100)).await;

    Mock::given(method("POST"))
        .and(path("/v1/counters"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "values": {} }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client
        .read_counters(&["1.3.6.1.1".to_string()])
        .await
        .unwrap_err();
    assert!(err.is_transient());
    match err {
        Error::Timeout { timeout_ms } => assert_eq!(timeout_ms, 100),
        other => panic!("expected Timeout error, got: {other:?}"),
    }
}
