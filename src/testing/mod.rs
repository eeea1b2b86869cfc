//! Testing utilities and mock implementations
//!
//! Mock LLM provider and web search backend so the workflow can be
//! exercised without network access or API keys.

pub mod mocks;

pub use mocks::*;
