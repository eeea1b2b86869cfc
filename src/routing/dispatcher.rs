//! Intent classification node
//!
//! Reads the whole transcript, asks the LLM for a schema-constrained
//! routing decision, appends the decision rationale as a supervisor
//! message, and hands the chosen specialist back to the engine.

use crate::error::{WorkflowError, WorkflowResult};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::routing::schema::DispatchOutput;
use crate::specialists::SpecialistKind;
use crate::transcript::{AuthorTag, Message, Role, Transcript};
use std::sync::Arc;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "\
You are a customer support workflow supervisor managing four specialists. \
Select the most appropriate next specialist for the current state of the \
task and give a clear, concise rationale for the decision.

Team members:
1. order: handles order-related inquiries (status, tracking, modifications) \
by querying the order database.
2. support: answers policy questions such as license information, terms and \
conditions, and data privacy from the knowledge base.
3. web_search_node: gathers current or additional information from the web.
4. human_node: fallback when no other specialist can give a proper response.

Responsibilities:
1. Analyze each user request and specialist response for completeness, \
accuracy, and relevance.
2. Route to the most appropriate specialist at each decision point.
3. Avoid redundant assignments; keep the workflow moving.
4. Continue until the user's request is fully resolved.";

/// Classifies intent and routes to a specialist
pub struct Dispatcher {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl Dispatcher {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 512,
            temperature: 0.0,
        }
    }

    /// Decide which specialist handles the transcript next
    ///
    /// Appends one supervisor-tagged rationale message. A transcript with no
    /// messages is a caller bug and fails before any LLM call.
    pub async fn dispatch(&self, transcript: &mut Transcript) -> WorkflowResult<SpecialistKind> {
        if transcript.is_empty() {
            return Err(WorkflowError::EmptyTranscript);
        }

        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
        messages.extend(transcript.messages().iter().map(to_chat_message));

        let request = CompletionRequest {
            messages,
            model: self.model.clone(),
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            output_schema: Some(DispatchOutput::output_schema()),
        };

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| WorkflowError::llm(format!("dispatch completion failed: {e}")))?;

        let content = response.content.unwrap_or_default();
        debug!(raw = %content, "dispatch completion");

        let output: DispatchOutput = serde_json::from_str(&content).map_err(|e| {
            WorkflowError::classification(format!("dispatch output is not valid JSON: {e}"))
        })?;
        output
            .validate()
            .map_err(WorkflowError::classification)?;

        info!(next = %output.next, reason = %output.reason, "dispatch decision");
        transcript.push(Message::new(
            output.reason,
            AuthorTag::Supervisor,
            Role::Human,
        ));

        Ok(output.next)
    }
}

fn to_chat_message(message: &Message) -> ChatMessage {
    match message.role {
        Role::Human => ChatMessage::user(&message.content),
        Role::Assistant => ChatMessage::assistant(&message.content),
        Role::System => ChatMessage::system(&message.content),
    }
}
