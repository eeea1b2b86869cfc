//! Human escalation node
//!
//! Fallback when no other specialist can produce a proper response. Emits
//! a fixed clarification request and routes back to the dispatcher rather
//! than the quality gate, so the dispatcher sees the escalation on its
//! next pass.

use super::{Specialist, SpecialistError, SpecialistKind, SpecialistReply};
use crate::engine::NodeId;
use crate::transcript::Transcript;
use async_trait::async_trait;

const ESCALATION_MESSAGE: &str =
    "Agent requires clarification or cannot proceed. Please provide more details or rephrase.";

#[derive(Debug, Default)]
pub struct HumanEscalation;

impl HumanEscalation {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Specialist for HumanEscalation {
    fn kind(&self) -> SpecialistKind {
        SpecialistKind::Human
    }

    fn successor(&self) -> NodeId {
        NodeId::Supervisor
    }

    async fn respond(&self, _transcript: &Transcript) -> Result<SpecialistReply, SpecialistError> {
        Ok(SpecialistReply::new(
            ESCALATION_MESSAGE,
            self.kind().reply_tag(),
        ))
    }
}
