//! Gemini client against a mock server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gig_api::config::GeminiConfig;
use gig_api::services::{GeminiClient, OracleError};
use gig_api::TextOracle;

const GENERATE_PATH: &str = "/models/gemini-test:generateContent";

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new(&GeminiConfig {
        api_key: Some("test-key".to_string()),
        model: "gemini-test".to_string(),
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn test_returns_first_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": { "maxOutputTokens": 200 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "{\"result\": \"Pass\"}" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = client_for(&server).generate("Grade this", 200).await.unwrap();
    assert_eq!(text, "{\"result\": \"Pass\"}");
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    match client_for(&server).generate("prompt", 100).await {
        Err(OracleError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "quota exceeded");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_candidates_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let result = client_for(&server).generate("prompt", 100).await;
    assert!(matches!(result, Err(OracleError::EmptyResponse)));
}

#[tokio::test]
async fn test_blank_text_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "   " }] } }]
        })))
        .mount(&server)
        .await;

    let result = client_for(&server).generate("prompt", 100).await;
    assert!(matches!(result, Err(OracleError::EmptyResponse)));
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client_for(&server).generate("prompt", 100).await;
    assert!(matches!(result, Err(OracleError::Decode(_))));
}
