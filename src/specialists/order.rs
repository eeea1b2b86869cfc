//! Order lookup specialist
//!
//! Two-step bounded pipeline instead of an open-ended tool loop: one
//! schema-constrained completion produces a single SELECT, the store runs
//! it read-only and capped, and a second completion turns the rows into an
//! answer. Nothing the model writes can mutate the database.

use super::{Specialist, SpecialistError, SpecialistKind, SpecialistReply};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, OutputSchema};
use crate::store::OrderStore;
use crate::transcript::Transcript;
use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const DEFAULT_ROW_CAP: usize = 5;

/// Structured output of the query-generation step
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct SqlQuery {
    /// A single read-only SQLite SELECT statement
    query: String,
}

impl SqlQuery {
    fn output_schema() -> OutputSchema {
        OutputSchema {
            name: "sql_query".to_string(),
            description: "A single read-only SQLite SELECT statement answering the user's question"
                .to_string(),
            schema: serde_json::to_value(schema_for!(SqlQuery)).unwrap_or_default(),
        }
    }
}

pub struct OrderSpecialist {
    provider: Arc<dyn LlmProvider>,
    model: String,
    store: Option<Arc<OrderStore>>,
    row_cap: usize,
}

impl OrderSpecialist {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        store: Option<Arc<OrderStore>>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            store,
            row_cap: DEFAULT_ROW_CAP,
        }
    }

    pub fn with_row_cap(mut self, row_cap: usize) -> Self {
        self.row_cap = row_cap;
        self
    }

    async fn generate_query(
        &self,
        question: &str,
        schema_summary: &str,
    ) -> Result<String, SpecialistError> {
        let system = format!(
            "You are an agent designed to interact with a SQLite database.\n\
             Given the question, produce one syntactically correct SQLite SELECT \
             statement. Unless the user specifies a number of results, limit the \
             query to at most {} rows. Never query for all columns from a table; \
             only select the columns relevant to the question. Do not produce any \
             DML statements (INSERT, UPDATE, DELETE, DROP, etc.).\n\n\
             Database schema:\n{}",
            self.row_cap, schema_summary
        );

        let request = CompletionRequest {
            messages: vec![ChatMessage::system(system), ChatMessage::user(question)],
            model: self.model.clone(),
            max_tokens: Some(512),
            temperature: Some(0.0),
            output_schema: Some(SqlQuery::output_schema()),
        };

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| SpecialistError::failed(format!("query generation failed: {e}")))?;
        let content = response.content.unwrap_or_default();
        let parsed: SqlQuery = serde_json::from_str(&content)
            .map_err(|e| SpecialistError::failed(format!("query output is not valid JSON: {e}")))?;
        if parsed.query.trim().is_empty() {
            return Err(SpecialistError::failed("generated query is empty"));
        }
        Ok(parsed.query)
    }

    async fn summarize(
        &self,
        question: &str,
        sql: &str,
        table: &str,
    ) -> Result<String, SpecialistError> {
        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(
                    "Answer the user's question using only the query results below. \
                     Be concise and factual; if the results do not contain the answer, \
                     say so plainly.",
                ),
                ChatMessage::user(format!(
                    "Question: {question}\n\nQuery: {sql}\n\nResults:\n{table}"
                )),
            ],
            model: self.model.clone(),
            max_tokens: Some(512),
            temperature: Some(0.0),
            output_schema: None,
        };

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| SpecialistError::failed(format!("summarization failed: {e}")))?;
        response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| SpecialistError::failed("summarization produced no content"))
    }
}

#[async_trait]
impl Specialist for OrderSpecialist {
    fn kind(&self) -> SpecialistKind {
        SpecialistKind::Order
    }

    async fn respond(&self, transcript: &Transcript) -> Result<SpecialistReply, SpecialistError> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| SpecialistError::unavailable("order database is not configured"))?;

        let question = transcript
            .latest_user_content()
            .ok_or_else(|| SpecialistError::failed("transcript has no user request"))?;

        let schema_summary = store
            .schema_summary()
            .map_err(|e| SpecialistError::failed(format!("schema introspection failed: {e}")))?;

        let sql = self.generate_query(question, &schema_summary).await?;
        debug!(sql = %sql, "generated order query");

        let result = store.run_query(&sql, self.row_cap).map_err(|e| {
            warn!(error = %e, "order query rejected or failed");
            SpecialistError::failed(format!("query execution failed: {e}"))
        })?;

        let answer = self.summarize(question, &sql, &result.render()).await?;
        Ok(SpecialistReply::new(answer, self.kind().reply_tag()))
    }
}
