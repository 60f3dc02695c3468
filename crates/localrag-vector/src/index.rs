use std::sync::Arc;

use localrag_core::traits::Ranker;
use localrag_core::{Chunk, Embedding, Error, IndexEntry, QueryResult, Result, RetrievalPath};

use crate::similarity::{cosine_similarity, magnitude};

/// Ordered `(chunk, embedding?, source)` entries.
///
/// The first stored embedding fixes the index dimension; a later vector of
/// another length is stored as null so every stored vector stays
/// comparable with every other. Zero-magnitude vectors cannot be ranked
/// and are stored as null too, so `has_embeddings` means "rankable".
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dim: Option<usize>,
    embedded: usize,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chunk attributed to its owning document.
    pub fn add(&mut self, chunk: Chunk, embedding: Option<Embedding>) {
        let source = chunk.doc_id.clone();
        self.add_with_source(chunk, embedding, source);
    }

    pub fn add_with_source(&mut self, chunk: Chunk, embedding: Option<Embedding>, source: impl Into<String>) {
        let embedding = embedding.and_then(|v| self.admit(&chunk, v));
        if embedding.is_some() {
            self.embedded += 1;
        }
        self.entries.push(IndexEntry { chunk: Arc::new(chunk), embedding, source: source.into() });
    }

    fn admit(&mut self, chunk: &Chunk, v: Embedding) -> Option<Embedding> {
        if v.is_empty() {
            tracing::warn!(chunk = %chunk.id, "empty embedding stored as null");
            return None;
        }
        let norm = magnitude(&v);
        if norm <= 0.0 || !norm.is_finite() {
            tracing::warn!(chunk = %chunk.id, "zero-magnitude embedding stored as null");
            return None;
        }
        match self.dim {
            None => {
                self.dim = Some(v.len());
                Some(v)
            }
            Some(d) if d == v.len() => Some(v),
            Some(d) => {
                tracing::warn!(chunk = %chunk.id, expected = d, found = v.len(), "embedding dimension mismatch, stored as null");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries carrying an embedding.
    pub fn embedded_len(&self) -> usize {
        self.embedded
    }

    /// Whether similarity search can rank anything at all.
    pub fn has_embeddings(&self) -> bool {
        self.embedded > 0
    }

    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.entries.iter().map(|e| e.chunk.as_ref())
    }

    /// Rank embedded entries by cosine similarity to `query`.
    ///
    /// Returns at most `k` passages, never padded. Zero-magnitude vectors
    /// are skipped. Fails with `NoEmbeddings` when nothing is embedded and
    /// with `DimensionMismatch` when `query` cannot be compared; both mean
    /// "use the lexical fallback".
    pub fn search(&self, query: &[f32], k: usize) -> Result<QueryResult> {
        if k == 0 {
            return Err(Error::Config("k must be at least 1".into()));
        }
        let Some(dim) = self.dim.filter(|_| self.has_embeddings()) else {
            return Err(Error::NoEmbeddings);
        };
        if query.len() != dim {
            return Err(Error::DimensionMismatch { expected: dim, found: query.len() });
        }
        let candidates = self
            .entries
            .iter()
            .filter_map(|e| {
                let v = e.embedding.as_deref()?;
                cosine_similarity(query, v).map(|s| e.passage(s))
            })
            .collect();
        Ok(QueryResult::ranked(RetrievalPath::Embedding, candidates, k))
    }
}

impl Ranker for VectorIndex {
    type Query = [f32];

    fn path(&self) -> RetrievalPath {
        RetrievalPath::Embedding
    }

    fn search(&self, query: &[f32], k: usize) -> Result<QueryResult> {
        VectorIndex::search(self, query, k)
    }
}
