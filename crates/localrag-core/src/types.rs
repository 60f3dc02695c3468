//! Domain types used by the chunker, the rankers and the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

pub type ChunkId = String;
pub type Meta = BTreeMap<String, String>;

/// Fixed-length vector produced by an embedding provider.
pub type Embedding = Vec<f32>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Text,
    Markdown,
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "text" => Some(Self::Text),
            "md" | "markdown" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }
}

/// A loaded source document, immutable once created.
///
/// - `id`: stable source identifier (usually the path)
/// - `text`: extracted plain text
/// - `format`: what the loader parsed it from
/// - `meta`: loader-provided extras (file name, size, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub format: DocumentFormat,
    #[serde(default)]
    pub meta: Meta,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>, format: DocumentFormat) -> Self {
        Self { id: id.into(), text: text.into(), format, meta: Meta::new() }
    }

    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// A contiguous span of a document's text; the atomic unit of retrieval.
///
/// `span` is a range of char offsets into `Document::text` and `text` is
/// exactly that slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub index: usize,
    pub text: String,
    pub span: Range<usize>,
}

/// One slot of the vector index: a chunk, its embedding if one could be
/// produced, and a denormalized source label for attribution.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Arc<Chunk>,
    pub embedding: Option<Embedding>,
    pub source: String,
}

impl IndexEntry {
    pub fn passage(&self, score: f32) -> Passage {
        Passage { source: self.source.clone(), chunk: Arc::clone(&self.chunk), score }
    }
}

/// Which ranking strategy served a query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalPath {
    Embedding,
    Lexical,
}

impl std::fmt::Display for RetrievalPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embedding => f.write_str("embedding"),
            Self::Lexical => f.write_str("lexical fallback"),
        }
    }
}

/// A ranked chunk with its attribution. `score` is ranker-specific but
/// higher is always better.
#[derive(Debug, Clone, Serialize)]
pub struct Passage {
    pub source: String,
    pub chunk: Arc<Chunk>,
    pub score: f32,
}

/// Ordered passages, descending by score, plus the path that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub path: RetrievalPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub passages: Vec<Passage>,
}

impl QueryResult {
    /// Sort candidates (given in ingestion order) by descending score and
    /// keep the best `k`. The sort is stable, so equal scores keep
    /// ingestion order.
    pub fn ranked(path: RetrievalPath, mut candidates: Vec<Passage>, k: usize) -> Self {
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(k);
        Self { path, fallback_reason: None, passages: candidates }
    }

    pub fn empty(path: RetrievalPath) -> Self {
        Self { path, fallback_reason: None, passages: Vec::new() }
    }

    #[must_use]
    pub fn with_fallback_reason(mut self, reason: impl Into<String>) -> Self {
        self.fallback_reason = Some(reason.into());
        self
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Passage> {
        self.passages.iter()
    }
}
