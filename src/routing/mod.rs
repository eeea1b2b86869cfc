//! Control nodes: intent classification and answer validation
//!
//! Both nodes drive the engine through structured LLM output; the schemas
//! in [`schema`] are closed enumerations, so an off-schema completion is a
//! classification error rather than a silent default route.

pub mod dispatcher;
pub mod schema;
pub mod validator;

pub use dispatcher::Dispatcher;
pub use schema::{DispatchOutput, VerdictOutput, VerdictTarget};
pub use validator::{QualityGate, Verdict};
