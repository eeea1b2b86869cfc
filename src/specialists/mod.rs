//! Specialist responder nodes and their shared contract
//!
//! Every specialist consumes the transcript, produces exactly one tagged
//! reply, and declares its successor node. All of them hand off to the
//! quality gate except human escalation, which routes back to the
//! dispatcher.

pub mod human;
pub mod order;
pub mod support;
pub mod web_search;

pub use human::HumanEscalation;
pub use order::OrderSpecialist;
pub use support::SupportSpecialist;
pub use web_search::WebSearchSpecialist;

use crate::engine::NodeId;
use crate::error::SpecialistError;
use crate::transcript::{AuthorTag, Transcript};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four routable specialists
///
/// This is the dispatcher's closed output enumeration; serde carries the
/// wire names the classification schema uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum SpecialistKind {
    /// Order-status lookups against the order database
    #[serde(rename = "order")]
    Order,
    /// Policy/FAQ lookups against the knowledge corpus
    #[serde(rename = "support")]
    Support,
    /// Current or supplementary information from the web
    #[serde(rename = "web_search_node")]
    WebSearch,
    /// Fallback when no specialist can produce a proper response
    #[serde(rename = "human_node")]
    Human,
}

impl SpecialistKind {
    /// Tag for a successful reply from this specialist
    pub fn reply_tag(self) -> AuthorTag {
        match self {
            SpecialistKind::Order => AuthorTag::Order,
            SpecialistKind::Support => AuthorTag::Support,
            SpecialistKind::WebSearch => AuthorTag::WebSearch,
            SpecialistKind::Human => AuthorTag::Human,
        }
    }

    /// Tag for a degraded (diagnostic) reply from this specialist
    pub fn error_tag(self) -> AuthorTag {
        match self {
            SpecialistKind::Order => AuthorTag::OrderError,
            SpecialistKind::Support => AuthorTag::SupportError,
            SpecialistKind::WebSearch => AuthorTag::WebSearchError,
            // Human escalation has no external dependency to degrade on
            SpecialistKind::Human => AuthorTag::Human,
        }
    }

    /// Fixed diagnostic content used when this specialist degrades
    pub fn diagnostic_message(self) -> &'static str {
        match self {
            SpecialistKind::Order => {
                "Database connection failed. Cannot process order request."
            }
            SpecialistKind::Support => {
                "Knowledge base not available. Cannot process support request."
            }
            SpecialistKind::WebSearch => {
                "Web search not available. Cannot process search request."
            }
            SpecialistKind::Human => "Escalation unavailable.",
        }
    }
}

impl fmt::Display for SpecialistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpecialistKind::Order => "order",
            SpecialistKind::Support => "support",
            SpecialistKind::WebSearch => "web_search_node",
            SpecialistKind::Human => "human_node",
        };
        f.write_str(name)
    }
}

/// One tagged message produced by a specialist visit
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialistReply {
    pub content: String,
    pub tag: AuthorTag,
}

impl SpecialistReply {
    pub fn new(content: impl Into<String>, tag: AuthorTag) -> Self {
        Self {
            content: content.into(),
            tag,
        }
    }
}

/// Contract every responder node satisfies
///
/// `respond` never appends to the transcript itself; the engine appends the
/// reply so the one-message-per-visit invariant is enforced in one place.
/// Errors are absorbed by the engine into the specialist's diagnostic
/// message; they never abort the run.
#[async_trait]
pub trait Specialist: Send + Sync {
    fn kind(&self) -> SpecialistKind;

    /// Node the engine transitions to after this specialist's append
    fn successor(&self) -> NodeId {
        NodeId::Validator
    }

    async fn respond(&self, transcript: &Transcript) -> Result<SpecialistReply, SpecialistError>;
}
