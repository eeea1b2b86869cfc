//! OpenAI provider wire-level tests against a mock HTTP server

use deskroute::llm::{
    ChatMessage, CompletionRequest, FinishReason, LlmError, LlmProvider, OpenAiConfig,
    OpenAiProvider, OutputSchema,
};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server: &MockServer) -> OpenAiProvider {
    OpenAiProvider::new(OpenAiConfig {
        api_key: "test-key".to_string(),
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "model": "gpt-4o-mini",
        "choices": [{
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19}
    })
}

#[tokio::test]
async fn completion_carries_bearer_auth_and_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({"model": "gpt-4o-mini"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("hello")))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider_for(&server)
        .complete(CompletionRequest {
            messages: vec![ChatMessage::user("hi")],
            model: "gpt-4o-mini".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("hello"));
    assert_eq!(response.finish_reason, FinishReason::Stop);
    assert_eq!(response.usage.total_tokens, 19);
}

#[tokio::test]
async fn structured_request_sends_json_schema_response_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "response_format": {
                "type": "json_schema",
                "json_schema": {"name": "dispatch_decision", "strict": true}
            }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body(r#"{"next": "order", "reason": "r"}"#)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = provider_for(&server)
        .complete(CompletionRequest {
            messages: vec![ChatMessage::user("where is my order")],
            model: "gpt-4o-mini".to_string(),
            output_schema: Some(OutputSchema {
                name: "dispatch_decision".to_string(),
                description: "Routing decision".to_string(),
                schema: serde_json::json!({"type": "object"}),
            }),
            ..Default::default()
        })
        .await
        .unwrap();

    let parsed: serde_json::Value =
        serde_json::from_str(response.content.as_deref().unwrap()).unwrap();
    assert_eq!(parsed["next"], "order");
}

#[tokio::test]
async fn server_error_is_retried_until_success() {
    let server = MockServer::start().await;
    // First two attempts fail, third succeeds
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream error"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("recovered")))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider_for(&server)
        .complete(CompletionRequest {
            messages: vec![ChatMessage::user("hi")],
            model: "gpt-4o-mini".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("recovered"));
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let result = provider_for(&server)
        .complete(CompletionRequest {
            messages: vec![ChatMessage::user("hi")],
            model: "gpt-4o-mini".to_string(),
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(LlmError::ApiError(_))));
}

#[tokio::test]
async fn health_check_hits_models_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    provider_for(&server).health_check().await.unwrap();
}
