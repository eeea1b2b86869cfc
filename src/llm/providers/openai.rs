//! OpenAI provider implementation

use crate::llm::provider::{
    ChatMessage, ChatRole, CompletionRequest, CompletionResponse, FinishReason, LlmError,
    LlmProvider, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

/// OpenAI provider configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::NotConfigured(
                "OpenAI API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn convert_message(message: &ChatMessage) -> OpenAiMessage {
        OpenAiMessage {
            role: match message.role {
                ChatRole::System => "system".to_string(),
                ChatRole::User => "user".to_string(),
                ChatRole::Assistant => "assistant".to_string(),
            },
            content: Some(message.content.clone()),
        }
    }

    /// Build the wire request, attaching a strict JSON schema when requested
    fn convert_request(request: &CompletionRequest) -> OpenAiCompletionRequest {
        let response_format = request.output_schema.as_ref().map(|schema| {
            OpenAiResponseFormat::JsonSchema {
                format_type: "json_schema".to_string(),
                json_schema: OpenAiJsonSchema {
                    name: schema.name.clone(),
                    strict: Some(true),
                    schema: schema.schema.clone(),
                },
            }
        });

        OpenAiCompletionRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(Self::convert_message).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format,
        }
    }

    fn parse_response(
        openai_response: OpenAiCompletionResponse,
    ) -> Result<CompletionResponse, LlmError> {
        let choice = openai_response
            .choices
            .first()
            .ok_or_else(|| LlmError::ApiError("No choices returned from OpenAI".to_string()))?;

        let usage = TokenUsage {
            prompt_tokens: openai_response.usage.prompt_tokens,
            completion_tokens: openai_response.usage.completion_tokens,
            total_tokens: openai_response.usage.total_tokens,
        };

        Ok(CompletionResponse {
            content: choice.message.content.clone(),
            model: openai_response.model,
            usage,
            finish_reason: Self::convert_finish_reason(choice.finish_reason.as_deref()),
        })
    }

    fn convert_finish_reason(reason: Option<&str>) -> FinishReason {
        match reason {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Error,
        }
    }

    /// Retry orchestrator: up to 3 retries with short fixed backoff
    async fn complete_with_retry(
        &self,
        openai_request: OpenAiCompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let backoff_delays = [100u64, 200, 300];
        let mut last_error = None;

        for (attempt, &delay_ms) in std::iter::once(&0u64)
            .chain(backoff_delays.iter())
            .enumerate()
        {
            if attempt > 0 {
                debug!("OpenAI retry attempt {} after {}ms delay", attempt, delay_ms);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            match self.make_api_request(&openai_request).await {
                Ok(openai_response) => {
                    if attempt > 0 {
                        debug!("OpenAI request succeeded after {} retries", attempt);
                    }
                    return Self::parse_response(openai_response);
                }
                Err(e) => {
                    warn!("OpenAI request attempt {} failed: {}", attempt + 1, e);
                    if !e.is_retryable() {
                        error!("Non-retryable OpenAI error, aborting: {}", e);
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        error!("OpenAI request failed after all retries");
        Err(last_error
            .unwrap_or_else(|| LlmError::NetworkError("All retry attempts failed".to_string())))
    }

    async fn make_api_request(
        &self,
        openai_request: &OpenAiCompletionRequest,
    ) -> Result<OpenAiCompletionResponse, LlmError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(openai_request)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(format!("HTTP request failed: {e}")))?;

        let status = response.status();

        if status.is_server_error() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError(format!(
                "OpenAI API server error: {status} - {error_text}"
            )));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "OpenAI API client error - Status: {}, Response: {}",
                status, error_text
            );
            return Err(LlmError::ApiError(format!(
                "OpenAI API error: {status} - {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn available_models(&self) -> Vec<String> {
        vec![
            "gpt-4o".to_string(),
            "gpt-4o-mini".to_string(),
            "gpt-4-turbo".to_string(),
            "gpt-4".to_string(),
        ]
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let openai_request = Self::convert_request(&request);

        debug!(
            messages = openai_request.messages.len(),
            structured = openai_request.response_format.is_some(),
            "OpenAI completion request"
        );

        self.complete_with_retry(openai_request).await
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        let response = self
            .client
            .get(format!("{}/models", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LlmError::AuthenticationFailed(
                "OpenAI API authentication failed".to_string(),
            ))
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAiCompletionRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAiResponseFormat>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiCompletionResponse {
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: OpenAiUsage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum OpenAiResponseFormat {
    JsonSchema {
        #[serde(rename = "type")]
        format_type: String,
        json_schema: OpenAiJsonSchema,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiJsonSchema {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    strict: Option<bool>,
    schema: serde_json::Value,
}
