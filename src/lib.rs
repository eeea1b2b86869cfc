//! Deskroute - LLM-routed customer support request router
//!
//! A supervisor/validator workflow over an append-only transcript: a
//! dispatcher classifies each request and routes it to one of four
//! specialists (order lookup, support knowledge, web search, human
//! escalation), and a quality gate decides whether the answer stands or
//! the request goes around again.
//!
//! # Quick Start
//!
//! ```rust
//! use deskroute::engine::WorkflowEngine;
//! use deskroute::routing::{Dispatcher, QualityGate};
//! use deskroute::specialists::{
//!     HumanEscalation, OrderSpecialist, SupportSpecialist, WebSearchSpecialist,
//! };
//! use deskroute::store::KnowledgeBase;
//! use deskroute::testing::MockLlmProvider;
//! use deskroute::transcript::Transcript;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let provider = Arc::new(MockLlmProvider::scripted(vec![
//!     r#"{"next": "support", "reason": "Policy question."}"#.to_string(),
//!     r#"{"next": "FINISH", "reason": "Answered."}"#.to_string(),
//! ]));
//!
//! let mut kb = KnowledgeBase::new();
//! kb.ingest("Refunds are available within 30 days of purchase.").unwrap();
//! let kb = Arc::new(kb);
//!
//! let engine = WorkflowEngine::new(
//!     Dispatcher::new(provider.clone(), "test-model"),
//!     QualityGate::new(provider.clone(), "test-model"),
//!     Box::new(OrderSpecialist::new(provider.clone(), "test-model", None)),
//!     Box::new(SupportSpecialist::new(Some(kb))),
//!     Box::new(WebSearchSpecialist::new(provider, "test-model", None)),
//!     Box::new(HumanEscalation::new()),
//! );
//!
//! let mut transcript = Transcript::seeded("What is the refund policy?");
//! engine.run(&mut transcript).await.unwrap();
//! assert!(transcript.visible_answer().unwrap().content.contains("Refunds"));
//! # });
//! ```

pub mod chat;
pub mod config;
pub mod engine;
pub mod error;
pub mod llm;
pub mod observability;
pub mod routing;
pub mod search;
pub mod specialists;
pub mod store;
pub mod testing;
pub mod transcript;

pub use engine::{NodeId, WorkflowEngine};
pub use error::{SpecialistError, WorkflowError, WorkflowResult};
pub use transcript::{AuthorTag, Message, Role, Transcript};
