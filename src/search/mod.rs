//! Web search client used by the web search specialist
//!
//! The trait keeps the specialist testable without network access; the
//! Tavily client is the production implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// One result from a web search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
}

#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("search not configured: {0}")]
    NotConfigured(String),
    #[error("search request failed: {0}")]
    RequestFailed(String),
    #[error("invalid search response: {0}")]
    InvalidResponse(String),
}

/// Search backend seam for dependency injection
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}

/// Tavily configuration
#[derive(Debug, Clone)]
pub struct TavilyConfig {
    pub api_key: String,
    pub base_url: String,
    pub max_results: usize,
    pub timeout: Duration,
}

impl Default for TavilyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.tavily.com".to_string(),
            max_results: 2,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Tavily search API client
pub struct TavilyClient {
    config: TavilyConfig,
    client: reqwest::Client,
}

impl TavilyClient {
    pub fn new(config: TavilyConfig) -> Result<Self, SearchError> {
        if config.api_key.is_empty() {
            return Err(SearchError::NotConfigured(
                "Tavily API key is required".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchError::RequestFailed(format!("client build failed: {e}")))?;
        Ok(Self { config, client })
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

#[async_trait]
impl WebSearch for TavilyClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!("{}/search", self.config.base_url);
        let body = TavilyRequest {
            api_key: &self.config.api_key,
            query,
            max_results: self.config.max_results,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SearchError::RequestFailed(format!(
                "HTTP {status}: {detail}"
            )));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        debug!(query, hits = parsed.results.len(), "web search completed");
        Ok(parsed
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                content: r.content,
            })
            .collect())
    }
}
