//! Structured output schemas for the two decision points
//!
//! The dispatcher and the quality gate each constrain the LLM to a small
//! schema: a closed `next` enumeration plus a free-text `reason`. Schemas
//! are generated with schemars and handed to the provider (OpenAI JSON
//! schema or Anthropic forced tool). Anything that fails to deserialize
//! into these types is a hard classification error, never a default route.

use crate::llm::provider::OutputSchema;
use crate::specialists::SpecialistKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Dispatcher decision: which specialist handles the request next
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DispatchOutput {
    /// Specialist to activate next
    pub next: SpecialistKind,
    /// Justification for the routing decision
    pub reason: String,
}

impl DispatchOutput {
    pub fn validate(&self) -> Result<(), String> {
        if self.reason.trim().is_empty() {
            return Err("reason must not be empty".to_string());
        }
        Ok(())
    }

    pub fn output_schema() -> OutputSchema {
        let schema = schemars::schema_for!(DispatchOutput);
        OutputSchema {
            name: "dispatch_decision".to_string(),
            description: "Select the next specialist for the support request".to_string(),
            schema: serde_json::to_value(schema).expect("schema serializes"),
        }
    }
}

/// Where the quality gate sends the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum VerdictTarget {
    /// Loop back for re-routing
    #[serde(rename = "supervisor")]
    Supervisor,
    /// Terminate the run; the answer stands
    #[serde(rename = "FINISH")]
    Finish,
}

/// Quality-gate decision over the latest specialist answer
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VerdictOutput {
    /// 'supervisor' to continue routing, 'FINISH' to terminate
    pub next: VerdictTarget,
    /// The reason for the decision
    pub reason: String,
}

impl VerdictOutput {
    pub fn validate(&self) -> Result<(), String> {
        if self.reason.trim().is_empty() {
            return Err("reason must not be empty".to_string());
        }
        Ok(())
    }

    pub fn output_schema() -> OutputSchema {
        let schema = schemars::schema_for!(VerdictOutput);
        OutputSchema {
            name: "verdict".to_string(),
            description: "Accept the latest answer or send the request back for re-routing"
                .to_string(),
            schema: serde_json::to_value(schema).expect("schema serializes"),
        }
    }
}
