//! Web search specialist
//!
//! Search-then-summarize: the search client gathers results, one LLM call
//! organizes them into a factual answer. The gathering prompt keeps the
//! model on information collection rather than analysis.

use super::{Specialist, SpecialistError, SpecialistKind, SpecialistReply};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::search::{SearchHit, WebSearch};
use crate::transcript::Transcript;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const SYSTEM_PROMPT: &str = "\
You are an information specialist with expertise in comprehensive research. \
Your responsibilities:
1. Identify key information needs based on the query context.
2. Gather relevant, accurate, and up-to-date information from the provided \
search results.
3. Organize findings in a structured, easily digestible format.
4. Cite sources (by URL) when possible to establish credibility.
5. Focus exclusively on information gathering; avoid analysis or \
implementation.
Provide thorough, factual responses without speculation where information \
is unavailable.";

pub struct WebSearchSpecialist {
    provider: Arc<dyn LlmProvider>,
    model: String,
    search: Option<Arc<dyn WebSearch>>,
}

impl WebSearchSpecialist {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        search: Option<Arc<dyn WebSearch>>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            search,
        }
    }
}

fn render_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "(no search results)".to_string();
    }
    hits.iter()
        .enumerate()
        .map(|(i, h)| format!("[{}] {} ({})\n{}", i + 1, h.title, h.url, h.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Specialist for WebSearchSpecialist {
    fn kind(&self) -> SpecialistKind {
        SpecialistKind::WebSearch
    }

    async fn respond(&self, transcript: &Transcript) -> Result<SpecialistReply, SpecialistError> {
        let search = self
            .search
            .as_ref()
            .ok_or_else(|| SpecialistError::unavailable("web search is not configured"))?;

        let question = transcript
            .latest_user_content()
            .ok_or_else(|| SpecialistError::failed("transcript has no user request"))?;

        let hits = search
            .search(question)
            .await
            .map_err(|e| SpecialistError::failed(format!("web search failed: {e}")))?;
        debug!(hits = hits.len(), "web search results");

        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(format!(
                    "Question: {question}\n\nSearch results:\n{}",
                    render_hits(&hits)
                )),
            ],
            model: self.model.clone(),
            max_tokens: Some(1024),
            temperature: Some(0.0),
            output_schema: None,
        };

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| SpecialistError::failed(format!("summarization failed: {e}")))?;
        let answer = response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| SpecialistError::failed("summarization produced no content"))?;

        Ok(SpecialistReply::new(answer, self.kind().reply_tag()))
    }
}
