//! Integration tests for `ResponsesClient` using wiremock HTTP mocks.

mod common;

use brandlens_analyzer::{AnalysisError, GenerateRequest, ResponsesClient, TransportError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{generative_config, text_response};

fn client(server: &MockServer) -> ResponsesClient {
    ResponsesClient::new(&generative_config(server)).expect("client construction should not fail")
}

#[tokio::test]
async fn generate_sends_credentials_and_returns_trimmed_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("openai-project", "proj_test"))
        .and(body_partial_json(json!({"model": "gpt-4.1-mini", "input": "ping"})))
        .respond_with(text_response("  pong \n"))
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server)
        .generate(&GenerateRequest::new("gpt-4.1-mini", "ping"))
        .await
        .expect("generate should succeed");
    assert_eq!(text, "pong");
}

#[tokio::test]
async fn blank_output_is_empty_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(text_response("   "))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate(&GenerateRequest::new("m", "ping"))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyOutput));
    assert!(err.is_retriable());
}

#[tokio::test]
async fn rate_limit_is_a_retriable_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate(&GenerateRequest::new("m", "ping"))
        .await
        .unwrap_err();
    match &err {
        AnalysisError::Transport(TransportError::Status { status, body }) => {
            assert_eq!(*status, 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_retriable());
}

#[tokio::test]
async fn unauthorized_is_not_retriable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "bad key"}})))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate(&GenerateRequest::new("m", "ping"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Transport(TransportError::Status { status: 401, .. })
    ));
    assert!(!err.is_retriable());
}

#[tokio::test]
async fn undecodable_envelope_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate(&GenerateRequest::new("m", "ping"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Transport(TransportError::Envelope(_))
    ));
}
