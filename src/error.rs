//! Error taxonomy for workflow runs
//!
//! Two layers: `SpecialistError` for failures a specialist absorbs into a
//! diagnostic message, and `WorkflowError` for control-flow failures that
//! abort the run. A bad classification must never be coerced into a default
//! route, so it lives on the aborting side.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Failure inside a specialist node
///
/// The engine absorbs both variants into a diagnostic message tagged with
/// the specialist's `_error` tag and continues the run.
#[derive(Debug, Clone, Error)]
pub enum SpecialistError {
    /// Backing resource was never configured (distinct from a failed call)
    #[error("backing resource unavailable: {detail}")]
    Unavailable { detail: String },

    /// The call was attempted and failed after any retries
    #[error("specialist call failed: {detail}")]
    Failed { detail: String },
}

impl SpecialistError {
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::Unavailable {
            detail: detail.into(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self::Failed {
            detail: detail.into(),
        }
    }
}

/// Control-flow failure that terminates a workflow run
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Dispatcher or quality-gate output failed the expected schema
    #[error("classification output violated schema: {message}")]
    Classification { message: String },

    /// LLM provider failure on the dispatch/validate path
    #[error("LLM provider error: {message}")]
    Llm { message: String },

    #[error("transcript is empty; a run needs a seed request")]
    EmptyTranscript,

    #[error("transcript has {len} message(s); validation needs the seed and at least one answer")]
    TranscriptTooShort { len: usize },

    /// The dispatch-cycle budget ran out before the quality gate approved
    #[error("dispatch cycle budget exhausted after {cycles} cycle(s)")]
    CycleBudgetExhausted { cycles: usize },

    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl WorkflowError {
    pub fn classification(message: impl Into<String>) -> Self {
        Self::Classification {
            message: message.into(),
        }
    }

    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
        }
    }
}

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").expect("secret pattern compiles")
});

const MAX_SANITIZED_LEN: usize = 500;

/// Scrub secrets and cap length before a message leaves the process
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = SECRET_PATTERN
        .replace_all(message, "${1}=***")
        .to_string();

    if sanitized.len() > MAX_SANITIZED_LEN {
        let suffix = "...[truncated]";
        let keep = MAX_SANITIZED_LEN - suffix.len();
        // Truncate on a char boundary
        let mut cut = keep;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str(suffix);
    }

    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specialist_error_constructors() {
        let err = SpecialistError::unavailable("no database configured");
        assert!(matches!(err, SpecialistError::Unavailable { .. }));
        assert!(err.to_string().contains("no database configured"));

        let err = SpecialistError::failed("timeout");
        assert!(matches!(err, SpecialistError::Failed { .. }));
    }

    #[test]
    fn workflow_error_display() {
        let err = WorkflowError::CycleBudgetExhausted { cycles: 8 };
        assert!(err.to_string().contains('8'));

        let err = WorkflowError::TranscriptTooShort { len: 1 };
        assert!(err.to_string().contains('1'));

        let err = WorkflowError::classification("unexpected field");
        assert!(err.to_string().contains("unexpected field"));
    }

    #[test]
    fn sanitize_redacts_secrets() {
        let sanitized =
            sanitize_error_message("auth failed: password=hunter2 api_key=abc token: xyz");

        assert!(!sanitized.contains("hunter2"));
        assert!(!sanitized.contains("abc"));
        assert!(!sanitized.contains("xyz"));
        assert!(sanitized.contains("password=***"));
    }

    #[test]
    fn sanitize_truncates_long_messages() {
        let sanitized = sanitize_error_message(&"x".repeat(600));
        assert!(sanitized.len() <= 500);
        assert!(sanitized.ends_with("...[truncated]"));
    }

    #[test]
    fn sanitize_leaves_short_messages_alone() {
        assert_eq!(sanitize_error_message("plain message"), "plain message");
        assert_eq!(sanitize_error_message(""), "");
    }
}
