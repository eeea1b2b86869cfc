//! LLM provider abstraction layer
//!
//! Provider-agnostic interface for classification and summarization calls,
//! with OpenAI and Anthropic backends.

pub mod provider;
pub mod providers;

pub use provider::*;
pub use providers::*;
