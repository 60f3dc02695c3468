use futures::{stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use localrag_core::config::Settings;
use localrag_core::traits::{Embedder, Ranker};
use localrag_core::{Chunk, Chunker, ChunkingConfig, Document, Embedding, Error, QueryResult, Result, RetrievalPath};
use localrag_text::LexicalScorer;
use localrag_vector::{magnitude, EmbeddingCache, VectorIndex};

/// Lifecycle of the pipeline.
///
/// `Initial --ingest--> Ready --query--> Ready`, or
/// `Initial --ingest(no chunks)--> IndexEmpty`, which is terminal.
#[derive(Debug, Clone, Default)]
pub enum PipelineState {
    #[default]
    Initial,
    Ready(Arc<VectorIndex>),
    IndexEmpty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub embedded: usize,
    /// Chunks stored without a vector.
    pub failed: usize,
    /// Provider calls saved by identical chunk text.
    pub cache_hits: usize,
}

/// Ranking strategy picked for one query by checking what is available.
enum Strategy {
    Embedding(Embedding),
    Lexical(String),
}

pub struct RetrievalPipeline {
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    lexical: LexicalScorer,
    top_k: usize,
    concurrency: usize,
    progress: bool,
    state: PipelineState,
}

impl RetrievalPipeline {
    pub fn new(
        chunking: ChunkingConfig,
        top_k: usize,
        embedder: Arc<dyn Embedder>,
        lexical: LexicalScorer,
    ) -> Result<Self> {
        if top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".into()));
        }
        Ok(Self {
            chunker: Chunker::new(chunking)?,
            embedder,
            lexical,
            top_k,
            concurrency: 1,
            progress: false,
            state: PipelineState::Initial,
        })
    }

    pub fn from_settings(settings: &Settings, embedder: Arc<dyn Embedder>) -> Result<Self> {
        settings.validate()?;
        let lexical = LexicalScorer::new(settings.retrieval.exclude_stop_words);
        Ok(Self::new(settings.chunking, settings.retrieval.top_k, embedder, lexical)?
            .with_concurrency(settings.embedding.concurrency))
    }

    /// Embedding calls kept in flight during ingestion (at least 1).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, PipelineState::Ready(_))
    }

    /// The live index. Readers keep their snapshot even if a later ingest
    /// swaps in a new one.
    pub fn snapshot(&self) -> Option<Arc<VectorIndex>> {
        match &self.state {
            PipelineState::Ready(index) => Some(Arc::clone(index)),
            _ => None,
        }
    }

    /// Chunk, embed and index `documents`, replacing any previous index.
    ///
    /// A chunk whose embedding fails is kept without a vector; the batch
    /// only fails when no chunk at all was produced, which moves the
    /// pipeline to the terminal `IndexEmpty` state.
    pub async fn ingest(&mut self, documents: &[Document]) -> Result<IngestReport> {
        if matches!(self.state, PipelineState::IndexEmpty) {
            return Err(Error::IndexEmpty);
        }
        let chunks = self.chunker.split_all(documents);
        if chunks.is_empty() {
            tracing::error!(documents = documents.len(), "no chunks produced; nothing to answer from");
            self.state = PipelineState::IndexEmpty;
            return Err(Error::IndexEmpty);
        }
        tracing::info!("Split {} documents into {} chunks", documents.len(), chunks.len());

        let (vectors, cache_hits) = self.embed_chunks(&chunks).await;
        let mut index = VectorIndex::new();
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            index.add(chunk, vector);
        }
        let report = IngestReport {
            documents: documents.len(),
            chunks: index.len(),
            embedded: index.embedded_len(),
            failed: index.len() - index.embedded_len(),
            cache_hits,
        };
        if report.embedded == 0 {
            tracing::warn!("no embeddings generated; queries will use lexical search only");
        } else if report.failed > 0 {
            tracing::warn!("{} of {} chunks have no embedding", report.failed, report.chunks);
        }
        tracing::info!(?report, "index ready");
        self.state = PipelineState::Ready(Arc::new(index));
        Ok(report)
    }

    /// Embed each distinct chunk text once, keeping up to `concurrency`
    /// requests in flight. Returns one optional vector per chunk, in order,
    /// and the number of chunks served from the cache.
    async fn embed_chunks(&self, chunks: &[Chunk]) -> (Vec<Option<Embedding>>, usize) {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).filter(|t| seen.insert(*t)).collect();
        let cache_hits = chunks.len() - unique.len();

        let pb = if self.progress { ProgressBar::new(unique.len() as u64) } else { ProgressBar::hidden() };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
                .map(|s| s.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let embedder = &self.embedder;
        let results: Vec<(&str, Result<Embedding>)> = stream::iter(unique)
            .map(|text| async move { (text, embedder.embed(text).await) })
            .buffered(self.concurrency)
            .inspect(|_| pb.inc(1))
            .collect()
            .await;
        pb.finish_with_message("embedded");

        let mut cache = EmbeddingCache::new(embedder.id());
        for (text, result) in results {
            match result {
                Ok(v) => cache.insert(text, v),
                Err(e) => tracing::warn!(error = %e, "embedding unavailable for chunk; stored without vector"),
            }
        }
        let vectors = chunks.iter().map(|c| cache.get(&c.text).cloned()).collect();
        (vectors, cache_hits)
    }

    pub async fn query(&self, question: &str) -> Result<QueryResult> {
        self.query_top_k(question, self.top_k).await
    }

    /// Retrieve at most `k` attributed passages for `question`.
    ///
    /// Embedding similarity is used when the index holds vectors and the
    /// question embeds; otherwise, or when the index cannot compare the
    /// query vector, the lexical fallback answers and the result records why.
    pub async fn query_top_k(&self, question: &str, k: usize) -> Result<QueryResult> {
        if k == 0 {
            return Err(Error::Config("k must be at least 1".into()));
        }
        let index = match &self.state {
            PipelineState::Ready(index) => Arc::clone(index),
            PipelineState::IndexEmpty => return Err(Error::IndexEmpty),
            PipelineState::Initial => return Err(Error::NotReady),
        };
        if question.trim().is_empty() {
            return Err(Error::EmptyInput);
        }

        match self.select_strategy(&index, question).await {
            Strategy::Embedding(v) => match index.search(&v, k) {
                Ok(result) => Ok(result),
                Err(e) if e.is_fallback_trigger() => self.lexical_search(&index, question, k, e.to_string()),
                Err(e) => Err(e),
            },
            Strategy::Lexical(reason) => self.lexical_search(&index, question, k, reason),
        }
    }

    async fn select_strategy(&self, index: &VectorIndex, question: &str) -> Strategy {
        if !index.has_embeddings() {
            return Strategy::Lexical("index holds no embeddings".into());
        }
        match self.embedder.embed(question).await {
            Ok(v) if magnitude(&v) > 0.0 => Strategy::Embedding(v),
            Ok(_) => Strategy::Lexical("query embedding has zero magnitude".into()),
            Err(e) => Strategy::Lexical(e.to_string()),
        }
    }

    fn lexical_search(&self, index: &VectorIndex, question: &str, k: usize, reason: String) -> Result<QueryResult> {
        tracing::warn!(%reason, "falling back to lexical search");
        let ranker = self.lexical.over(index.entries());
        match ranker.search(question, k) {
            Ok(result) => Ok(result.with_fallback_reason(reason)),
            // a question of punctuation only has no terms to match
            Err(Error::EmptyInput) => Ok(QueryResult::empty(RetrievalPath::Lexical).with_fallback_reason(reason)),
            Err(e) => Err(e),
        }
    }
}
