//! Anthropic provider implementation
//!
//! Structured output is implemented as a forced tool: the requested output
//! schema becomes the tool's input schema and `tool_choice` requires it, so
//! the model's tool input is the structured result. The provider serializes
//! that input back into `content` so callers parse one shape regardless of
//! provider.

use crate::llm::provider::{
    ChatMessage, ChatRole, CompletionRequest, CompletionResponse, FinishReason, LlmError,
    LlmProvider, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Anthropic provider configuration
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub version: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.anthropic.com/v1".to_string(),
            timeout: Duration::from_secs(60),
            version: "2023-06-01".to_string(),
        }
    }
}

pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::NotConfigured(
                "Anthropic API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Split out the system prompt; Anthropic takes it as a top-level field
    fn convert_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_message = None;
        let mut anthropic_messages = Vec::new();

        for message in messages {
            match message.role {
                ChatRole::System => {
                    system_message = Some(message.content.clone());
                }
                ChatRole::User | ChatRole::Assistant => {
                    anthropic_messages.push(AnthropicMessage {
                        role: match message.role {
                            ChatRole::User => "user".to_string(),
                            ChatRole::Assistant => "assistant".to_string(),
                            ChatRole::System => unreachable!(),
                        },
                        content: message.content.clone(),
                    });
                }
            }
        }

        (system_message, anthropic_messages)
    }

    fn convert_finish_reason(reason: Option<&str>) -> FinishReason {
        match reason {
            Some("end_turn") | Some("stop_sequence") | Some("tool_use") => FinishReason::Stop,
            Some("max_tokens") => FinishReason::Length,
            _ => FinishReason::Error,
        }
    }

    /// Fold response blocks back into a single content string
    ///
    /// A forced-tool response carries the structured result as the tool
    /// input object; plain responses carry text blocks.
    fn extract_content(blocks: Vec<AnthropicContent>) -> Result<String, LlmError> {
        for block in &blocks {
            if let AnthropicContent::ToolUse { input, .. } = block {
                return serde_json::to_string(input)
                    .map_err(|e| LlmError::InvalidResponse(e.to_string()));
            }
        }

        let text: Vec<&str> = blocks
            .iter()
            .filter_map(|block| match block {
                AnthropicContent::Text { text } => Some(text.as_str()),
                AnthropicContent::ToolUse { .. } => None,
            })
            .collect();

        if text.is_empty() {
            return Err(LlmError::ApiError(
                "No content returned from Anthropic".to_string(),
            ));
        }

        Ok(text.join(""))
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn available_models(&self) -> Vec<String> {
        vec![
            "claude-3-5-sonnet-20241022".to_string(),
            "claude-3-5-haiku-20241022".to_string(),
            "claude-3-haiku-20240307".to_string(),
        ]
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let (system_message, messages) = Self::convert_messages(&request.messages);

        let (tools, tool_choice) = match &request.output_schema {
            Some(schema) => (
                Some(vec![AnthropicTool {
                    name: schema.name.clone(),
                    description: schema.description.clone(),
                    input_schema: schema.schema.clone(),
                }]),
                Some(AnthropicToolChoice {
                    choice_type: "tool".to_string(),
                    name: schema.name.clone(),
                }),
            ),
            None => (None, None),
        };

        let anthropic_request = AnthropicCompletionRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(4096),
            messages,
            system: system_message,
            temperature: request.temperature,
            tools,
            tool_choice,
        };

        let response = self
            .client
            .post(format!("{}/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.version)
            .header("Content-Type", "application/json")
            .json(&anthropic_request)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError(format!(
                "Anthropic API error: {status} - {error_text}"
            )));
        }

        let anthropic_response: AnthropicCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let usage = TokenUsage {
            prompt_tokens: anthropic_response.usage.input_tokens,
            completion_tokens: anthropic_response.usage.output_tokens,
            total_tokens: anthropic_response.usage.input_tokens
                + anthropic_response.usage.output_tokens,
        };

        let finish_reason =
            Self::convert_finish_reason(anthropic_response.stop_reason.as_deref());
        let content = Self::extract_content(anthropic_response.content)?;

        Ok(CompletionResponse {
            content: Some(content),
            model: anthropic_response.model,
            usage,
            finish_reason,
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        // No dedicated health endpoint; issue a minimal completion
        let test_request = AnthropicCompletionRequest {
            model: "claude-3-haiku-20240307".to_string(),
            max_tokens: 1,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: "Hi".to_string(),
            }],
            system: None,
            temperature: None,
            tools: None,
            tool_choice: None,
        };

        let response = self
            .client
            .post(format!("{}/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.version)
            .header("Content-Type", "application/json")
            .json(&test_request)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LlmError::AuthenticationFailed(
                "Anthropic API authentication failed".to_string(),
            ))
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicCompletionRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<AnthropicToolChoice>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct AnthropicToolChoice {
    #[serde(rename = "type")]
    choice_type: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicCompletionResponse {
    content: Vec<AnthropicContent>,
    model: String,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContent {
    Text {
        text: String,
    },
    ToolUse {
        #[allow(dead_code)]
        name: String,
        input: serde_json::Value,
    },
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_default() {
        let config = AnthropicConfig::default();
        assert_eq!(config.base_url, "https://api.anthropic.com/v1");
        assert_eq!(config.version, "2023-06-01");
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn creation_without_api_key_fails() {
        let result = AnthropicProvider::new(AnthropicConfig::default());
        assert!(matches!(result, Err(LlmError::NotConfigured(_))));
    }

    #[test]
    fn system_message_split_out() {
        let messages = vec![
            ChatMessage::system("You are helpful"),
            ChatMessage::user("Hello"),
        ];

        let (system, anthropic_messages) = AnthropicProvider::convert_messages(&messages);
        assert_eq!(system, Some("You are helpful".to_string()));
        assert_eq!(anthropic_messages.len(), 1);
        assert_eq!(anthropic_messages[0].role, "user");
    }

    #[test]
    fn finish_reason_conversion() {
        assert_eq!(
            AnthropicProvider::convert_finish_reason(Some("end_turn")),
            FinishReason::Stop
        );
        assert_eq!(
            AnthropicProvider::convert_finish_reason(Some("tool_use")),
            FinishReason::Stop
        );
        assert_eq!(
            AnthropicProvider::convert_finish_reason(Some("max_tokens")),
            FinishReason::Length
        );
        assert_eq!(
            AnthropicProvider::convert_finish_reason(None),
            FinishReason::Error
        );
    }

    #[test]
    fn tool_use_block_becomes_json_content() {
        let blocks = vec![AnthropicContent::ToolUse {
            name: "dispatch".to_string(),
            input: json!({"next": "order", "reason": "order id present"}),
        }];

        let content = AnthropicProvider::extract_content(blocks).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["next"], "order");
    }

    #[test]
    fn text_blocks_joined() {
        let blocks = vec![
            AnthropicContent::Text {
                text: "Hello ".to_string(),
            },
            AnthropicContent::Text {
                text: "world".to_string(),
            },
        ];

        assert_eq!(
            AnthropicProvider::extract_content(blocks).unwrap(),
            "Hello world"
        );
    }

    #[test]
    fn empty_content_is_an_error() {
        let result = AnthropicProvider::extract_content(vec![]);
        assert!(matches!(result, Err(LlmError::ApiError(_))));
    }
}
