//! HTTP front end
//!
//! One POST /chat endpoint runs a full workflow per request and returns
//! the visible answer plus the full transcript; GET /health reports which
//! backends were wired at startup. Each request gets its own transcript,
//! so nothing is shared between runs.

use crate::engine::WorkflowEngine;
use crate::error::{sanitize_error_message, WorkflowError};
use crate::transcript::{Message, Transcript};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info};
use warp::Filter;

const FALLBACK_ANSWER: &str =
    "Sorry, I couldn't generate a response. Please try rephrasing your request.";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    /// False when the run was cut short and the answer is partial or a fallback
    pub completed: bool,
    /// Full run transcript, for callers that render intermediate steps
    pub transcript: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Which backends were configured at startup
#[derive(Debug, Clone, Serialize)]
pub struct Readiness {
    pub provider: String,
    pub orders: bool,
    pub knowledge: bool,
    pub search: bool,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(flatten)]
    readiness: Readiness,
}

/// Serves the workflow over HTTP
pub struct ChatServer {
    engine: Arc<WorkflowEngine>,
    readiness: Readiness,
    bind_address: IpAddr,
    port: u16,
}

impl ChatServer {
    pub fn new(
        engine: Arc<WorkflowEngine>,
        readiness: Readiness,
        bind_address: IpAddr,
        port: u16,
    ) -> Self {
        Self {
            engine,
            readiness,
            bind_address,
            port,
        }
    }

    /// Run one workflow for a single request body
    ///
    /// `Err` carries a sanitized message for an HTTP 500; degenerate runs
    /// (budget exhaustion, blank input) stay `Ok` with `completed: false`.
    pub async fn handle_chat(
        engine: &WorkflowEngine,
        request: ChatRequest,
    ) -> Result<ChatResponse, String> {
        let trimmed = request.message.trim();
        if trimmed.is_empty() {
            return Ok(ChatResponse {
                answer: FALLBACK_ANSWER.to_string(),
                completed: false,
                transcript: Vec::new(),
            });
        }

        let mut transcript = Transcript::seeded(trimmed);
        match engine.run(&mut transcript).await {
            Ok(()) => {
                let answer = transcript
                    .visible_answer()
                    .map(|m| m.content.clone())
                    .unwrap_or_else(|| FALLBACK_ANSWER.to_string());
                Ok(ChatResponse {
                    answer,
                    completed: true,
                    transcript: transcript.messages().to_vec(),
                })
            }
            Err(WorkflowError::CycleBudgetExhausted { cycles }) => {
                // Degenerate run; surface whatever partial content exists
                info!(cycles, "run ended by cycle budget, serving partial answer");
                let answer = transcript
                    .visible_answer()
                    .map(|m| m.content.clone())
                    .unwrap_or_else(|| FALLBACK_ANSWER.to_string());
                Ok(ChatResponse {
                    answer,
                    completed: false,
                    transcript: transcript.messages().to_vec(),
                })
            }
            Err(err) => {
                error!(error = %err, "workflow run failed");
                Err(sanitize_error_message(&err.to_string()))
            }
        }
    }

    /// Start serving until the process is shut down
    pub async fn start(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let engine = self.engine.clone();
        let readiness = self.readiness.clone();

        // POST /chat
        let chat_route = warp::path("chat")
            .and(warp::post())
            .and(warp::body::content_length_limit(64 * 1024))
            .and(warp::body::json())
            .and_then(move |request: ChatRequest| {
                let engine = engine.clone();
                async move {
                    let reply = match Self::handle_chat(&engine, request).await {
                        Ok(response) => warp::reply::with_status(
                            warp::reply::json(&response),
                            warp::http::StatusCode::OK,
                        ),
                        Err(message) => warp::reply::with_status(
                            warp::reply::json(&ErrorResponse { error: message }),
                            warp::http::StatusCode::INTERNAL_SERVER_ERROR,
                        ),
                    };
                    Ok::<_, Infallible>(reply)
                }
            });

        // GET /health
        let health_route = warp::path("health").and(warp::get()).map(move || {
            warp::reply::json(&HealthResponse {
                status: "healthy",
                timestamp: chrono::Utc::now(),
                readiness: readiness.clone(),
            })
        });

        let routes = chat_route
            .or(health_route)
            .recover(handle_rejection)
            .with(warp::trace::request());

        let addr = SocketAddr::new(self.bind_address, self.port);
        info!(%addr, "chat server listening");
        warp::serve(routes).run(addr).await;
        Ok(())
    }
}

async fn handle_rejection(rejection: warp::Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, message) = if rejection.is_not_found() {
        (warp::http::StatusCode::NOT_FOUND, "not found".to_string())
    } else {
        (
            warp::http::StatusCode::BAD_REQUEST,
            sanitize_error_message(&format!("{rejection:?}")),
        )
    };
    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorResponse { error: message }),
        status,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Dispatcher, QualityGate};
    use crate::specialists::{HumanEscalation, SupportSpecialist};
    use crate::store::KnowledgeBase;
    use crate::testing::MockLlmProvider;
    use crate::transcript::AuthorTag;

    fn engine(provider: Arc<MockLlmProvider>) -> WorkflowEngine {
        let mut kb = KnowledgeBase::new();
        kb.ingest("Refunds are available within 30 days of purchase.")
            .unwrap();
        let kb = Arc::new(kb);
        WorkflowEngine::new(
            Dispatcher::new(provider.clone(), "test-model"),
            QualityGate::new(provider.clone(), "test-model"),
            Box::new(SupportSpecialist::new(Some(kb.clone()))),
            Box::new(SupportSpecialist::new(Some(kb))),
            Box::new(SupportSpecialist::new(None)),
            Box::new(HumanEscalation::new()),
        )
    }

    #[tokio::test]
    async fn chat_returns_visible_answer_and_transcript() {
        let provider = Arc::new(MockLlmProvider::scripted(vec![
            r#"{"next": "support", "reason": "Policy question."}"#.to_string(),
            r#"{"next": "FINISH", "reason": "Answered."}"#.to_string(),
        ]));
        let response = ChatServer::handle_chat(
            &engine(provider),
            ChatRequest {
                message: "What is the refund policy?".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(response.completed);
        assert!(response.answer.contains("Refunds"));
        assert_eq!(response.transcript.len(), 4);
        assert_eq!(response.transcript[0].tag, AuthorTag::User);
    }

    #[tokio::test]
    async fn empty_message_gets_fallback() {
        let provider = Arc::new(MockLlmProvider::with_failure("must not be called"));
        let response = ChatServer::handle_chat(
            &engine(provider),
            ChatRequest {
                message: "   ".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(!response.completed);
        assert_eq!(response.answer, FALLBACK_ANSWER);
        assert!(response.transcript.is_empty());
    }

    #[tokio::test]
    async fn workflow_failure_is_a_sanitized_error() {
        let provider = Arc::new(MockLlmProvider::with_failure(
            "provider down: api key=sk-secret",
        ));
        let result = ChatServer::handle_chat(
            &engine(provider),
            ChatRequest {
                message: "anything".to_string(),
            },
        )
        .await;

        let message = result.unwrap_err();
        assert!(!message.contains("sk-secret"));
    }

    #[tokio::test]
    async fn exhausted_budget_serves_partial_answer() {
        let mut script = Vec::new();
        for _ in 0..10 {
            script.push(r#"{"next": "support", "reason": "Policy."}"#.to_string());
            script.push(r#"{"next": "supervisor", "reason": "Try again."}"#.to_string());
        }
        let provider = Arc::new(MockLlmProvider::scripted(script));
        let engine = engine(provider).with_max_dispatch_cycles(2);

        let response = ChatServer::handle_chat(
            &engine,
            ChatRequest {
                message: "loop".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(!response.completed);
        // Partial content from the support node, not the fallback
        assert!(response.answer.contains("Refunds"));
    }
}
