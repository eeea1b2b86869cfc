//! Support specialist
//!
//! Answers policy and FAQ questions by retrieving the top-K passages from
//! the knowledge corpus and concatenating them in rank order. No LLM call;
//! the quality gate judges whether the retrieved text answers the question.

use super::{Specialist, SpecialistError, SpecialistKind, SpecialistReply};
use crate::store::KnowledgeBase;
use crate::transcript::Transcript;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const DEFAULT_TOP_K: usize = 3;

pub struct SupportSpecialist {
    knowledge: Option<Arc<KnowledgeBase>>,
    top_k: usize,
}

impl SupportSpecialist {
    pub fn new(knowledge: Option<Arc<KnowledgeBase>>) -> Self {
        Self {
            knowledge,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }
}

#[async_trait]
impl Specialist for SupportSpecialist {
    fn kind(&self) -> SpecialistKind {
        SpecialistKind::Support
    }

    async fn respond(&self, transcript: &Transcript) -> Result<SpecialistReply, SpecialistError> {
        let knowledge = self
            .knowledge
            .as_ref()
            .ok_or_else(|| SpecialistError::unavailable("knowledge base is not configured"))?;

        let question = transcript
            .latest_user_content()
            .ok_or_else(|| SpecialistError::failed("transcript has no user request"))?;

        let passages = knowledge.retrieve(question, self.top_k);
        debug!(hits = passages.len(), top_k = self.top_k, "support retrieval");
        if passages.is_empty() {
            return Err(SpecialistError::failed(
                "knowledge base has no passages to retrieve",
            ));
        }

        let combined = passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(SpecialistReply::new(combined, self.kind().reply_tag()))
    }
}
