//! Workflow engine
//!
//! Drives one run through the node graph: dispatcher picks a specialist,
//! the specialist appends its reply, the quality gate either terminates or
//! loops back. The dispatch-cycle budget bounds the loop so a pathological
//! resubmission cycle cannot run forever.

use crate::error::{WorkflowError, WorkflowResult};
use crate::routing::{Dispatcher, QualityGate, Verdict};
use crate::specialists::{Specialist, SpecialistKind};
use crate::transcript::{Message, Role, Transcript};
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_MAX_DISPATCH_CYCLES: usize = 8;

/// Workflow graph nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeId {
    /// Dispatcher (intent classification)
    Supervisor,
    /// One of the four responder nodes
    Specialist(SpecialistKind),
    /// Quality gate
    Validator,
    /// Terminal state
    End,
}

/// One fully wired workflow, ready to run transcripts
pub struct WorkflowEngine {
    dispatcher: Dispatcher,
    gate: QualityGate,
    order: Box<dyn Specialist>,
    support: Box<dyn Specialist>,
    web_search: Box<dyn Specialist>,
    human: Box<dyn Specialist>,
    max_dispatch_cycles: usize,
}

impl WorkflowEngine {
    pub fn new(
        dispatcher: Dispatcher,
        gate: QualityGate,
        order: Box<dyn Specialist>,
        support: Box<dyn Specialist>,
        web_search: Box<dyn Specialist>,
        human: Box<dyn Specialist>,
    ) -> Self {
        Self {
            dispatcher,
            gate,
            order,
            support,
            web_search,
            human,
            max_dispatch_cycles: DEFAULT_MAX_DISPATCH_CYCLES,
        }
    }

    pub fn with_max_dispatch_cycles(mut self, max: usize) -> Self {
        self.max_dispatch_cycles = max.max(1);
        self
    }

    fn specialist(&self, kind: SpecialistKind) -> &dyn Specialist {
        match kind {
            SpecialistKind::Order => self.order.as_ref(),
            SpecialistKind::Support => self.support.as_ref(),
            SpecialistKind::WebSearch => self.web_search.as_ref(),
            SpecialistKind::Human => self.human.as_ref(),
        }
    }

    /// Run the workflow to completion, appending to the caller's transcript
    ///
    /// The transcript keeps whatever was appended before a failure, so the
    /// front end can still surface partial content when the cycle budget is
    /// exhausted.
    pub async fn run(&self, transcript: &mut Transcript) -> WorkflowResult<()> {
        let run_id = Uuid::new_v4();
        let mut node = NodeId::Supervisor;
        let mut cycles = 0usize;

        info!(%run_id, "workflow run started");

        loop {
            match node {
                NodeId::Supervisor => {
                    cycles += 1;
                    if cycles > self.max_dispatch_cycles {
                        warn!(%run_id, cycles = self.max_dispatch_cycles, "dispatch cycle budget exhausted");
                        return Err(WorkflowError::CycleBudgetExhausted {
                            cycles: self.max_dispatch_cycles,
                        });
                    }
                    let kind = self.dispatcher.dispatch(transcript).await?;
                    info!(%run_id, cycle = cycles, next = %kind, "transition: supervisor");
                    node = NodeId::Specialist(kind);
                }
                NodeId::Specialist(kind) => {
                    let specialist = self.specialist(kind);
                    match specialist.respond(transcript).await {
                        Ok(reply) => {
                            transcript.push(Message::new(reply.content, reply.tag, Role::Human));
                        }
                        Err(error) => {
                            // Degradation is absorbed as a tagged diagnostic;
                            // the run continues and the gate judges it.
                            warn!(%run_id, specialist = %kind, %error, "specialist degraded");
                            transcript.push(Message::new(
                                kind.diagnostic_message(),
                                kind.error_tag(),
                                Role::Human,
                            ));
                        }
                    }
                    node = specialist.successor();
                    info!(%run_id, specialist = %kind, next = ?node, "transition: specialist");
                }
                NodeId::Validator => {
                    node = match self.gate.validate(transcript).await? {
                        Verdict::Finish => NodeId::End,
                        Verdict::Resubmit => NodeId::Supervisor,
                    };
                    info!(%run_id, next = ?node, "transition: validator");
                }
                NodeId::End => {
                    info!(%run_id, messages = transcript.len(), "workflow run finished");
                    return Ok(());
                }
            }
        }
    }
}
