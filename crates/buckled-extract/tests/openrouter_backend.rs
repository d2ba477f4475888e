//! HTTP behavior of the OpenRouter backend against a mock collaborator.

use std::sync::Arc;
use std::time::Duration;

use buckled_extract::backend::ChatMessage;
use buckled_extract::{
    BackendError, CompletionBackend, CompletionRequest, ExtractionClient, ExtractionConfig,
    OpenRouterBackend, RateLimiter,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_reply(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "gen-123",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn request() -> CompletionRequest {
    CompletionRequest {
        model: "test/text-model".into(),
        messages: vec![ChatMessage::user_text("hello")],
        max_tokens: 50,
        temperature: Some(0.1),
    }
}

fn backend(server: &MockServer) -> OpenRouterBackend {
    OpenRouterBackend::new(
        format!("{}/v1", server.uri()),
        Some("sk-test".into()),
        Duration::from_secs(10),
    )
    .expect("backend")
}

#[tokio::test]
async fn test_completion_sends_bearer_and_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "test/text-model",
            "max_tokens": 50
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("OK")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = backend(&server).complete(&request()).await.unwrap();
    assert_eq!(reply, "OK");
}

#[tokio::test]
async fn test_429_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = backend(&server).complete(&request()).await.unwrap_err();
    assert!(matches!(err, BackendError::RateLimited));
}

#[tokio::test]
async fn test_server_error_maps_to_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    match backend(&server).complete(&request()).await {
        Err(BackendError::Api { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream down");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_blank_content_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("   ")))
        .mount(&server)
        .await;

    let err = backend(&server).complete(&request()).await.unwrap_err();
    assert!(matches!(err, BackendError::EmptyResponse));
}

#[tokio::test]
async fn test_client_extracts_text_end_to_end() {
    let server = MockServer::start().await;
    let content = r#"Here you go:
{"serviceInfo": {"primaryService": "Oil Change", "category": "Maintenance", "urgencyLevel": "low", "confidence": 90},
 "vehicleInfo": {"year": 2020, "make": "Subaru", "model": "Outback", "mileage": "48,000"}}"#;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(serde_json::json!({ "model": "test/text-model" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(content)))
        .expect(1)
        .mount(&server)
        .await;

    let config = ExtractionConfig {
        base_url: format!("{}/v1", server.uri()),
        api_key: Some("sk-test".into()),
        text_model: "test/text-model".into(),
        min_request_interval_ms: 0,
        ..Default::default()
    };
    let limiter = Arc::new(RateLimiter::new(Duration::ZERO));
    let client = ExtractionClient::from_config(&config, limiter).unwrap();

    let record = client.extract_from_text("oild change for my outback", None).await;
    assert_eq!(record.service_info.primary_service, "Oil Change");
    assert_eq!(record.service_info.confidence.value, 90);
    assert_eq!(record.vehicle_info.make.as_deref(), Some("Subaru"));
    assert_eq!(record.vehicle_info.mileage, Some(48000));
    assert_eq!(record.raw_data.original_text.as_deref(), Some("oild change for my outback"));
}
