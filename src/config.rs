//! TOML configuration for the router service
//!
//! API keys are never stored in the file; each section names the
//! environment variable to read at startup. Sections for the optional
//! backends (orders, knowledge, search) may be omitted entirely, in which
//! case the matching specialist runs in degraded mode.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouterConfig {
    #[serde(default)]
    pub service: ServiceSection,
    pub llm: LlmSection,
    #[serde(default)]
    pub workflow: WorkflowSection,
    pub orders: Option<OrdersSection>,
    pub knowledge: Option<KnowledgeSection>,
    pub search: Option<SearchSection>,
}

/// HTTP front-end settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceSection {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// LLM provider settings shared by all nodes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSection {
    /// Provider name ("openai" or "anthropic")
    pub provider: String,
    /// Model identifier
    pub model: String,
    /// Environment variable containing the API key
    pub api_key_env: String,
    /// Optional base URL override (for proxies and tests)
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Workflow engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowSection {
    /// Dispatcher visits allowed per run before the run is aborted
    #[serde(default = "default_max_dispatch_cycles")]
    pub max_dispatch_cycles: usize,
}

impl Default for WorkflowSection {
    fn default() -> Self {
        Self {
            max_dispatch_cycles: default_max_dispatch_cycles(),
        }
    }
}

fn default_max_dispatch_cycles() -> usize {
    8
}

/// Order database settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrdersSection {
    /// SQLite database file
    pub db_path: PathBuf,
    /// Optional SQL script applied on startup
    pub seed_script: Option<PathBuf>,
    #[serde(default = "default_row_cap")]
    pub row_cap: usize,
}

fn default_row_cap() -> usize {
    5
}

/// Knowledge corpus settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeSection {
    /// Text files ingested on startup
    pub files: Vec<PathBuf>,
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_chunk_chars() -> usize {
    400
}

fn default_overlap_chars() -> usize {
    80
}

fn default_top_k() -> usize {
    3
}

/// Web search settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchSection {
    /// Environment variable containing the search API key
    pub api_key_env: String,
    pub base_url: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    2
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RouterConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: RouterConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.llm.provider.as_str() {
            "openai" | "anthropic" => {}
            other => {
                return Err(ConfigError::InvalidConfig(format!(
                    "unknown LLM provider `{other}`, expected `openai` or `anthropic`"
                )));
            }
        }
        if self.llm.model.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "llm.model must not be empty".to_string(),
            ));
        }
        if let Some(base_url) = &self.llm.base_url {
            url::Url::parse(base_url).map_err(|e| {
                ConfigError::InvalidConfig(format!("llm.base_url is not a valid URL: {e}"))
            })?;
        }
        if let Some(search) = &self.search {
            if let Some(base_url) = &search.base_url {
                url::Url::parse(base_url).map_err(|e| {
                    ConfigError::InvalidConfig(format!("search.base_url is not a valid URL: {e}"))
                })?;
            }
        }
        if self.workflow.max_dispatch_cycles == 0 {
            return Err(ConfigError::InvalidConfig(
                "workflow.max_dispatch_cycles must be at least 1".to_string(),
            ));
        }
        if let Some(knowledge) = &self.knowledge {
            if knowledge.overlap_chars >= knowledge.chunk_chars {
                return Err(ConfigError::InvalidConfig(
                    "knowledge.overlap_chars must be smaller than knowledge.chunk_chars"
                        .to_string(),
                ));
            }
        }
        Ok(())
    }

    /// LLM API key from the configured environment variable
    pub fn llm_api_key(&self) -> Result<String, ConfigError> {
        require_env(&self.llm.api_key_env)
    }

    /// Search API key, if a search section is configured
    pub fn search_api_key(&self) -> Result<Option<String>, ConfigError> {
        match &self.search {
            Some(section) => require_env(&section.api_key_env).map(Some),
            None => Ok(None),
        }
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::EnvVarNotFound(name.to_string()))
}
