//! Live validation tests against a mock Anthropic endpoint

use ccm_providers::{AnthropicClient, KeyStatus, KeyValidator, ProviderError, ANTHROPIC_VERSION};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_valid_key_returns_valid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("x-api-key", "sk-ant-good"))
        .and(header("anthropic-version", ANTHROPIC_VERSION))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":[]}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnthropicClient::new();
    let status = client
        .validate_key("sk-ant-good", Some(&server.uri()))
        .await
        .expect("request should succeed");

    assert_eq!(status, KeyStatus::Valid);
    assert!(status.is_valid());
}

#[tokio::test]
async fn test_unauthorized_returns_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#,
        ))
        .mount(&server)
        .await;

    let client = AnthropicClient::new();
    let status = client
        .validate_key("sk-ant-bad", Some(&server.uri()))
        .await
        .expect("auth failures are not transport errors");

    assert_eq!(status, KeyStatus::Invalid);
}

#[tokio::test]
async fn test_forbidden_returns_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let status = AnthropicClient::new()
        .validate_key("sk-ant-revoked", Some(&server.uri()))
        .await
        .unwrap();

    assert_eq!(status, KeyStatus::Invalid);
}

#[tokio::test]
async fn test_server_error_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(529).set_body_string(
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        ))
        .mount(&server)
        .await;

    let err = AnthropicClient::new()
        .validate_key("sk-ant-good", Some(&server.uri()))
        .await
        .unwrap_err();

    match err {
        ProviderError::Status { status, message } => {
            assert_eq!(status, 529);
            assert_eq!(message, "Overloaded");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = AnthropicClient::with_timeout(Duration::from_millis(100));
    let err = client
        .validate_key("sk-ant-good", Some(&server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Transport(_)));
}
