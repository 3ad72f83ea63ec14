//! Integration tests for the HTTP chat client against a mocked endpoint.

use argus::config::LlmConfig;
use argus::error::LlmError;
use argus::llm::{ChatClient, HttpChatClient, LlmSettings};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/v1/chat/completions";

fn client_for(server: &MockServer) -> HttpChatClient {
    let settings = LlmSettings {
        base_url: format!("{}{}", server.uri(), ENDPOINT),
        api_key: "test-key".to_string(),
        model: "test-model".to_string(),
    };
    HttpChatClient::new(settings, &LlmConfig::default()).expect("Failed to build client")
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ]
    })
}

#[tokio::test]
async fn test_successful_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("authorization", "Bearer test-key"))
        .and(header("x-title", "Argus Git Commit Analyzer"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "temperature": 1.0,
            "max_tokens": 2048,
            "messages": [
                { "role": "system", "content": "system text" },
                { "role": "user", "content": "user text" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("**📋 Summary**: ok")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .complete("system text", "user text")
        .await
        .unwrap();

    assert_eq!(reply.content, "**📋 Summary**: ok");
    assert!(reply.elapsed_secs >= 0.0);
}

#[tokio::test]
async fn test_server_error_is_connection_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = client_for(&server).complete("s", "u").await.unwrap_err();

    match &err {
        LlmError::Connection {
            status, message, ..
        } => {
            assert_eq!(*status, Some(500));
            assert!(message.contains("upstream exploded"));
        }
        other => panic!("Expected Connection error, got {:?}", other),
    }
    assert!(!err.is_rate_limited());
    assert!(err.elapsed_secs().is_some());
}

#[tokio::test]
async fn test_429_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "Too many requests" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).complete("s", "u").await.unwrap_err();
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).complete("s", "u").await.unwrap_err();
    assert!(matches!(err, LlmError::Parse { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_missing_choices_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "message": "model overloaded" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).complete("s", "u").await.unwrap_err();

    match err {
        LlmError::Protocol { body, .. } => assert!(body.contains("model overloaded")),
        other => panic!("Expected Protocol error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_is_connection_error() {
    let settings = LlmSettings {
        // Port 9 (discard) is closed on test machines
        base_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
        api_key: "k".to_string(),
        model: "m".to_string(),
    };
    let client = HttpChatClient::new(settings, &LlmConfig::default()).unwrap();

    let err = client.complete("s", "u").await.unwrap_err();
    match err {
        LlmError::Connection {
            status,
            elapsed_secs,
            ..
        } => {
            assert!(status.is_none());
            assert!(elapsed_secs.is_none());
        }
        other => panic!("Expected Connection error, got {:?}", other),
    }
}
