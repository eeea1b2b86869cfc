//! Mock implementations for tests

use crate::llm::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, TokenUsage,
};
use crate::search::{SearchError, SearchHit, WebSearch};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Scripted LLM provider
///
/// Serves its responses in order, cycling when the script runs out, so a
/// single instance can back the dispatcher, the gate, and the specialists
/// of one engine.
#[derive(Debug)]
pub struct MockLlmProvider {
    responses: Vec<String>,
    current_response: Arc<Mutex<usize>>,
    failure: Option<String>,
}

impl MockLlmProvider {
    pub fn scripted(responses: Vec<String>) -> Self {
        Self {
            responses,
            current_response: Arc::new(Mutex::new(0)),
            failure: None,
        }
    }

    pub fn single_response(response: impl Into<String>) -> Self {
        Self::scripted(vec![response.into()])
    }

    pub fn with_failure(detail: impl Into<String>) -> Self {
        Self {
            responses: vec![],
            current_response: Arc::new(Mutex::new(0)),
            failure: Some(detail.into()),
        }
    }

    /// How many completions have been served so far
    pub async fn calls(&self) -> usize {
        *self.current_response.lock().await
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn available_models(&self) -> Vec<String> {
        vec!["mock-model".to_string()]
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if let Some(detail) = &self.failure {
            return Err(LlmError::RequestFailed(detail.clone()));
        }

        let mut current = self.current_response.lock().await;
        let index = *current % self.responses.len().max(1);
        *current += 1;

        let content = if self.responses.is_empty() {
            "Mock response".to_string()
        } else {
            self.responses[index].clone()
        };

        Ok(CompletionResponse {
            content: Some(content),
            model: "mock-model".to_string(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            finish_reason: FinishReason::Stop,
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        match &self.failure {
            Some(detail) => Err(LlmError::RequestFailed(detail.clone())),
            None => Ok(()),
        }
    }
}

/// Canned web search backend
#[derive(Debug)]
pub struct MockWebSearch {
    hits: Vec<SearchHit>,
    error: Option<SearchError>,
}

impl MockWebSearch {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self { hits, error: None }
    }

    pub fn with_error(error: SearchError) -> Self {
        Self {
            hits: vec![],
            error: Some(error),
        }
    }

    pub fn empty() -> Self {
        Self::with_hits(vec![])
    }
}

#[async_trait]
impl WebSearch for MockWebSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, SearchError> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(self.hits.clone()),
        }
    }
}
