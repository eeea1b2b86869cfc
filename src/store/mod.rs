//! Local data backends: the order database and the knowledge corpus

pub mod knowledge;
pub mod orders;

pub use knowledge::{KnowledgeBase, Passage};
pub use orders::{OrderStore, QueryResult};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite open failed at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("sqlite statement failed: {source}")]
    Sql {
        #[source]
        source: rusqlite::Error,
    },
    #[error("only read-only SELECT statements are allowed, got: {statement}")]
    NotReadOnly { statement: String },
    #[error("knowledge document is empty")]
    EmptyDocument,
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<rusqlite::Error> for StoreError {
    fn from(source: rusqlite::Error) -> Self {
        StoreError::Sql { source }
    }
}
