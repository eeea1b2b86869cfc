//! Quality gate node
//!
//! Judges the latest specialist answer against the original request and
//! decides whether the run terminates or goes back to the dispatcher. The
//! policy is deliberately lenient: resubmission is reserved for answers
//! that are off-topic or fundamentally wrong.

use crate::error::{WorkflowError, WorkflowResult};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::routing::schema::{VerdictOutput, VerdictTarget};
use crate::transcript::{AuthorTag, Message, Role, Transcript};
use std::sync::Arc;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "\
Your task is to ensure reasonable quality.
Specifically, you must:
- Review the user's question (the first message in the workflow).
- Review the answer (the last message in the workflow).
- If the answer addresses the core intent of the question, even if not \
perfectly, signal to end the workflow with 'FINISH'.
- Only route back to the supervisor if the answer is completely off-topic, \
harmful, or fundamentally misunderstands the question.

- Accept answers that are good enough rather than perfect.
- Prioritize workflow completion over perfect responses.
- Give the benefit of the doubt to borderline answers.

Routing guidelines:
1. 'supervisor': ONLY for responses that are completely incorrect or off-topic.
2. 'FINISH' in all other cases to end the workflow.";

/// The gate's decision for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Answer rejected; route back to the dispatcher
    Resubmit,
    /// Answer accepted; terminate the run
    Finish,
}

/// Validates specialist answers before the run may terminate
pub struct QualityGate {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl QualityGate {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 512,
            temperature: 0.0,
        }
    }

    /// Judge the latest answer; appends one validator-tagged rationale
    ///
    /// Needs at least the seed and one candidate answer, so a transcript
    /// shorter than two messages fails before any LLM call.
    pub async fn validate(&self, transcript: &mut Transcript) -> WorkflowResult<Verdict> {
        if transcript.len() < 2 {
            return Err(WorkflowError::TranscriptTooShort {
                len: transcript.len(),
            });
        }

        // The gate sees only the two ends of the run, not the routing
        // chatter in between.
        let question = transcript.seed().map(|m| m.content.clone()).unwrap_or_default();
        let answer = transcript.last().map(|m| m.content.clone()).unwrap_or_default();

        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(question),
                ChatMessage::assistant(answer),
            ],
            model: self.model.clone(),
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            output_schema: Some(VerdictOutput::output_schema()),
        };

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| WorkflowError::llm(format!("verdict completion failed: {e}")))?;

        let content = response.content.unwrap_or_default();
        debug!(raw = %content, "verdict completion");

        let output: VerdictOutput = serde_json::from_str(&content).map_err(|e| {
            WorkflowError::classification(format!("verdict output is not valid JSON: {e}"))
        })?;
        output
            .validate()
            .map_err(WorkflowError::classification)?;

        let verdict = match output.next {
            VerdictTarget::Supervisor => Verdict::Resubmit,
            VerdictTarget::Finish => Verdict::Finish,
        };
        info!(verdict = ?verdict, reason = %output.reason, "quality gate decision");

        transcript.push(Message::new(
            output.reason,
            AuthorTag::Validator,
            Role::Human,
        ));

        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLlmProvider;

    fn answered_transcript() -> Transcript {
        let mut transcript = Transcript::seeded("What is your refund policy?");
        transcript.push(Message::new(
            "routing to support",
            AuthorTag::Supervisor,
            Role::Human,
        ));
        transcript.push(Message::new(
            "Refunds are available within 30 days.",
            AuthorTag::Support,
            Role::Human,
        ));
        transcript
    }

    #[tokio::test]
    async fn finish_verdict_terminates() {
        let provider = Arc::new(MockLlmProvider::single_response(
            r#"{"next": "FINISH", "reason": "The answer addresses the question."}"#,
        ));
        let gate = QualityGate::new(provider, "test-model");
        let mut transcript = answered_transcript();

        let verdict = gate.validate(&mut transcript).await.unwrap();

        assert_eq!(verdict, Verdict::Finish);
        let rationale = transcript.last().unwrap();
        assert_eq!(rationale.tag, AuthorTag::Validator);
        assert_eq!(rationale.content, "The answer addresses the question.");
    }

    #[tokio::test]
    async fn supervisor_verdict_resubmits() {
        let provider = Arc::new(MockLlmProvider::single_response(
            r#"{"next": "supervisor", "reason": "The answer is off-topic."}"#,
        ));
        let gate = QualityGate::new(provider, "test-model");
        let mut transcript = answered_transcript();

        let verdict = gate.validate(&mut transcript).await.unwrap();
        assert_eq!(verdict, Verdict::Resubmit);
    }

    #[tokio::test]
    async fn short_transcript_is_rejected_before_any_call() {
        let provider = Arc::new(MockLlmProvider::with_failure("must not be called"));
        let gate = QualityGate::new(provider, "test-model");
        let mut transcript = Transcript::seeded("only the seed");

        let result = gate.validate(&mut transcript).await;
        assert!(matches!(
            result,
            Err(WorkflowError::TranscriptTooShort { len: 1 })
        ));
    }

    #[tokio::test]
    async fn off_schema_verdict_is_a_classification_error() {
        let provider = Arc::new(MockLlmProvider::single_response(
            r#"{"next": "maybe", "reason": "unsure"}"#,
        ));
        let gate = QualityGate::new(provider, "test-model");
        let mut transcript = answered_transcript();

        let result = gate.validate(&mut transcript).await;
        assert!(matches!(result, Err(WorkflowError::Classification { .. })));
    }
}
