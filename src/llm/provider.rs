//! LLM provider abstraction
//!
//! Provider-agnostic interface for the classification and summarization
//! calls the workflow makes. Structured output is requested per provider:
//! OpenAI via `response_format` JSON schema, Anthropic via a forced tool
//! whose input schema is the output schema. Providers normalize both paths
//! so callers always parse `CompletionResponse::content` as JSON when a
//! schema was requested.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single role-tagged message sent to a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// Completion request parameters
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// When set, the provider constrains output to this schema
    pub output_schema: Option<OutputSchema>,
}

/// A named JSON schema the completion must conform to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSchema {
    pub name: String,
    pub description: String,
    pub schema: serde_json::Value,
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Text output; JSON text when an output schema was requested
    pub content: Option<String>,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: FinishReason,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason why completion finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Error,
}

/// LLM provider trait for dependency injection and testing
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "openai", "anthropic")
    fn name(&self) -> &str;

    /// Models this provider can serve
    fn available_models(&self) -> Vec<String>;

    /// Generate a completion from the given request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Check if the provider is configured and reachable
    async fn health_check(&self) -> Result<(), LlmError>;
}

/// LLM provider errors
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("API error: {0}")]
    ApiError(String),
}

impl LlmError {
    /// Whether a fresh attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::NetworkError(_) => true,
            LlmError::ApiError(msg) => msg.contains("server error"),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_constructors_set_roles() {
        assert_eq!(ChatMessage::system("a").role, ChatRole::System);
        assert_eq!(ChatMessage::user("b").role, ChatRole::User);
        assert_eq!(ChatMessage::assistant("c").role, ChatRole::Assistant);
    }

    #[test]
    fn chat_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ChatRole::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&ChatRole::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&ChatRole::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn retryable_classification() {
        assert!(LlmError::NetworkError("reset".into()).is_retryable());
        assert!(LlmError::ApiError("upstream server error: 502".into()).is_retryable());
        assert!(!LlmError::AuthenticationFailed("bad key".into()).is_retryable());
        assert!(!LlmError::InvalidResponse("not json".into()).is_retryable());
    }

    #[test]
    fn errors_have_nonempty_display() {
        let errors = vec![
            LlmError::NotConfigured("x".into()),
            LlmError::AuthenticationFailed("x".into()),
            LlmError::RequestFailed("x".into()),
            LlmError::InvalidResponse("x".into()),
            LlmError::NetworkError("x".into()),
            LlmError::ApiError("x".into()),
        ];
        for error in errors {
            assert!(!error.to_string().is_empty());
        }
    }
}
