//! In-process knowledge corpus for the support specialist
//!
//! Documents are chunked with overlap, embedded with a hashed bag-of-words
//! projection, and retrieved by cosine similarity. The embedding is
//! deterministic and entirely local, so retrieval never touches the
//! network and tests need no fixtures beyond plain text.

use super::StoreError;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const EMBEDDING_DIMS: usize = 512;
pub const DEFAULT_CHUNK_CHARS: usize = 400;
pub const DEFAULT_OVERLAP_CHARS: usize = 80;

/// One retrievable chunk of a source document
#[derive(Debug, Clone)]
pub struct Passage {
    pub text: String,
    embedding: Vec<f32>,
}

/// Chunked, embedded corpus with cosine top-K retrieval
pub struct KnowledgeBase {
    passages: Vec<Passage>,
    chunk_chars: usize,
    overlap_chars: usize,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::with_chunking(DEFAULT_CHUNK_CHARS, DEFAULT_OVERLAP_CHARS)
    }

    pub fn with_chunking(chunk_chars: usize, overlap_chars: usize) -> Self {
        let overlap_chars = overlap_chars.min(chunk_chars.saturating_sub(1));
        Self {
            passages: Vec::new(),
            chunk_chars: chunk_chars.max(1),
            overlap_chars,
        }
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Chunk and embed one document into the corpus
    pub fn ingest(&mut self, document: &str) -> Result<usize, StoreError> {
        if document.trim().is_empty() {
            return Err(StoreError::EmptyDocument);
        }
        let chunks = chunk_text(document, self.chunk_chars, self.overlap_chars);
        let added = chunks.len();
        for text in chunks {
            let embedding = embed(&text);
            self.passages.push(Passage { text, embedding });
        }
        debug!(added, total = self.passages.len(), "ingested document");
        Ok(added)
    }

    /// Ingest a UTF-8 text file
    pub fn ingest_file(&mut self, path: &Path) -> Result<usize, StoreError> {
        let document = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let added = self.ingest(&document)?;
        info!(path = %path.display(), chunks = added, "loaded knowledge file");
        Ok(added)
    }

    /// Top-K passages by cosine similarity to the query
    pub fn retrieve(&self, query: &str, k: usize) -> Vec<&Passage> {
        let query_embedding = embed(query);
        let mut scored: Vec<(f32, &Passage)> = self
            .passages
            .iter()
            .map(|p| (cosine_similarity(&query_embedding, &p.embedding), p))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().take(k).map(|(_, p)| p).collect()
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

/// Split into character-bounded chunks with trailing overlap, breaking on
/// whitespace where possible.
fn chunk_text(document: &str, chunk_chars: usize, overlap_chars: usize) -> Vec<String> {
    let chars: Vec<char> = document.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let mut end = (start + chunk_chars).min(chars.len());
        if end < chars.len() {
            // Back up to the nearest whitespace so words stay whole
            let mut cut = end;
            while cut > start && !chars[cut - 1].is_whitespace() {
                cut -= 1;
            }
            if cut > start {
                end = cut;
            }
        }
        let chunk: String = chars[start..end].iter().collect();
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        if end >= chars.len() {
            break;
        }
        start = end.saturating_sub(overlap_chars).max(start + 1);
    }

    chunks
}

/// Hashed bag-of-words projection into a fixed-dimension unit vector
fn embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; EMBEDDING_DIMS];
    for token in tokenize(text) {
        let bucket = (fnv1a(&token) as usize) % EMBEDDING_DIMS;
        vector[bucket] += 1.0;
    }
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn fnv1a(token: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in token.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    // Embeddings are unit-normalized, so the dot product is the cosine
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
