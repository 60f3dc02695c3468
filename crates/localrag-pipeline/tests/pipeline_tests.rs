use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use localrag_core::config::Settings;
use localrag_core::traits::Embedder;
use localrag_core::{ChunkingConfig, Document, DocumentFormat, Embedding, Error, RetrievalPath};
use localrag_embed::FakeEmbedder;
use localrag_pipeline::{PipelineState, RetrievalPipeline};
use localrag_text::LexicalScorer;

const VOCAB: [&str; 5] = ["cat", "sat", "sit", "dog", "ran"];

/// Bag-of-words over a tiny vocabulary, so similarities are easy to reason about.
#[derive(Default)]
struct VocabEmbedder {
    calls: AtomicUsize,
    /// Fail every call once set.
    down: AtomicBool,
    /// Fail any text containing this word.
    reject: Option<&'static str>,
}

#[async_trait]
impl Embedder for VocabEmbedder {
    fn id(&self) -> &str {
        "test:vocab"
    }

    async fn embed(&self, text: &str) -> localrag_core::Result<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        if self.down.load(Ordering::SeqCst) {
            return Err(Error::ProviderUnavailable("provider offline".into()));
        }
        let lower = text.to_lowercase();
        if self.reject.is_some_and(|w| lower.contains(w)) {
            return Err(Error::ProviderUnavailable("rejected".into()));
        }
        let mut v = vec![0.0f32; VOCAB.len()];
        for token in lower.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            if let Some(i) = VOCAB.iter().position(|w| *w == token) {
                v[i] += 1.0;
            }
        }
        Ok(v)
    }
}

fn cat_doc() -> Document {
    Document::new("notes.txt", "The cat sat. The dog ran.", DocumentFormat::Text)
}

fn pipeline(embedder: Arc<dyn Embedder>) -> RetrievalPipeline {
    RetrievalPipeline::new(ChunkingConfig::new(20, 5), 3, embedder, LexicalScorer::new(true)).expect("pipeline")
}

#[tokio::test]
async fn cat_question_ranks_the_cat_chunk_first() {
    let mut p = pipeline(Arc::new(VocabEmbedder::default()));
    let report = p.ingest(&[cat_doc()]).await.expect("ingest");
    assert_eq!(report.chunks, 2);
    assert_eq!(report.embedded, 2);
    assert_eq!(report.failed, 0);

    let result = p.query("Where did the cat sit?").await.expect("query");
    assert_eq!(result.path, RetrievalPath::Embedding);
    assert!(result.fallback_reason.is_none());
    assert_eq!(result.len(), 2);
    let top = &result.passages[0];
    assert_eq!(top.chunk.id, "notes.txt#0");
    assert_eq!(top.chunk.text, "The cat sat. The dog");
    assert_eq!(top.chunk.span, 0..20);
    assert_eq!(top.source, "notes.txt");
    assert!(result.passages[0].score >= result.passages[1].score);
}

#[tokio::test]
async fn provider_outage_degrades_to_lexical_ranking() {
    let embedder = Arc::new(VocabEmbedder::default());
    embedder.down.store(true, Ordering::SeqCst);
    let mut p = pipeline(embedder);
    let report = p.ingest(&[cat_doc()]).await.expect("ingest still succeeds");
    assert_eq!(report.embedded, 0);
    assert_eq!(report.failed, 2);

    let result = p.query("Where did the cat sit?").await.expect("no error surfaced");
    assert_eq!(result.path, RetrievalPath::Lexical);
    assert!(result.fallback_reason.is_some());
    assert_eq!(result.len(), 1);
    assert_eq!(result.passages[0].chunk.id, "notes.txt#0");
}

#[tokio::test]
async fn query_time_outage_degrades_to_lexical_ranking() {
    let embedder = Arc::new(VocabEmbedder::default());
    let mut p = pipeline(embedder.clone());
    p.ingest(&[cat_doc()]).await.expect("ingest");

    embedder.down.store(true, Ordering::SeqCst);
    let result = p.query("the dog").await.expect("query");
    assert_eq!(result.path, RetrievalPath::Lexical);
    let reason = result.fallback_reason.as_deref().unwrap_or_default();
    assert!(reason.contains("provider offline"), "{reason}");
    let ids: Vec<_> = result.iter().map(|p| p.chunk.id.as_str()).collect();
    assert_eq!(ids, ["notes.txt#0", "notes.txt#1"]);
}

#[tokio::test]
async fn one_failed_chunk_does_not_sink_ingestion() {
    let embedder = Arc::new(VocabEmbedder { reject: Some("ran"), ..Default::default() });
    let mut p = pipeline(embedder);
    let report = p.ingest(&[cat_doc()]).await.expect("ingest");
    assert_eq!(report.embedded, 1);
    assert_eq!(report.failed, 1);

    let index = p.snapshot().expect("ready");
    assert_eq!(index.len(), 2);
    assert!(index.entries()[1].embedding.is_none());

    let result = p.query("cat").await.expect("query");
    assert_eq!(result.path, RetrievalPath::Embedding);
    assert_eq!(result.len(), 1);
    assert_eq!(result.passages[0].chunk.id, "notes.txt#0");
}

#[tokio::test]
async fn zero_magnitude_query_uses_lexical_ranking() {
    let mut p = pipeline(Arc::new(VocabEmbedder::default()));
    p.ingest(&[cat_doc()]).await.expect("ingest");
    let result = p.query("Where is it?").await.expect("query");
    assert_eq!(result.path, RetrievalPath::Lexical);
    assert!(result.is_empty());
}

/// Degenerate provider: zero vectors for passages, a unit vector for questions.
struct ZeroPassageEmbedder;

#[async_trait]
impl Embedder for ZeroPassageEmbedder {
    fn id(&self) -> &str {
        "test:zero"
    }

    async fn embed(&self, text: &str) -> localrag_core::Result<Embedding> {
        Ok(if text.trim_end().ends_with('?') { vec![1.0, 0.0] } else { vec![0.0, 0.0] })
    }
}

#[tokio::test]
async fn zero_magnitude_passages_fall_back_to_lexical_ranking() {
    let mut p = pipeline(Arc::new(ZeroPassageEmbedder));
    let report = p.ingest(&[cat_doc()]).await.expect("ingest");
    assert_eq!(report.embedded, 0);
    assert_eq!(report.failed, 2);

    let result = p.query("Where did the cat sit?").await.expect("query");
    assert_eq!(result.path, RetrievalPath::Lexical);
    assert!(result.fallback_reason.is_some());
    assert_eq!(result.len(), 1);
    assert_eq!(result.passages[0].chunk.id, "notes.txt#0");
}

#[tokio::test]
async fn no_documents_leaves_index_empty_for_good() {
    let mut p = pipeline(Arc::new(VocabEmbedder::default()));
    assert!(matches!(p.ingest(&[]).await, Err(Error::IndexEmpty)));
    assert!(matches!(p.state(), PipelineState::IndexEmpty));
    assert!(matches!(p.query("cat").await, Err(Error::IndexEmpty)));
    assert!(matches!(p.ingest(&[cat_doc()]).await, Err(Error::IndexEmpty)));

    let mut p = pipeline(Arc::new(VocabEmbedder::default()));
    let blank = Document::new("empty.txt", "", DocumentFormat::Text);
    assert!(matches!(p.ingest(&[blank]).await, Err(Error::IndexEmpty)));
}

#[tokio::test]
async fn queries_are_refused_before_ingest() {
    let p = pipeline(Arc::new(VocabEmbedder::default()));
    assert!(!p.is_ready());
    assert!(matches!(p.query("cat").await, Err(Error::NotReady)));
}

#[tokio::test]
async fn blank_question_is_rejected_without_embedding() {
    let embedder = Arc::new(VocabEmbedder::default());
    let mut p = pipeline(embedder.clone());
    p.ingest(&[cat_doc()]).await.expect("ingest");
    let before = embedder.calls.load(Ordering::SeqCst);
    assert!(matches!(p.query("   \n").await, Err(Error::EmptyInput)));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), before);
}

#[tokio::test]
async fn top_k_bounds_results() {
    let mut p = pipeline(Arc::new(VocabEmbedder::default()));
    p.ingest(&[cat_doc()]).await.expect("ingest");
    assert_eq!(p.query_top_k("cat dog", 1).await.expect("query").len(), 1);
    assert_eq!(p.query_top_k("cat dog", 10).await.expect("query").len(), 2);
    assert!(matches!(p.query_top_k("cat", 0).await, Err(Error::Config(_))));
}

#[tokio::test]
async fn reingesting_same_documents_gives_same_answers() {
    let mut p = pipeline(Arc::new(VocabEmbedder::default()));
    p.ingest(&[cat_doc()]).await.expect("ingest");
    let first = p.query("dog ran").await.expect("query");
    let old = p.snapshot().expect("ready");

    p.ingest(&[cat_doc()]).await.expect("ingest again");
    let second = p.query("dog ran").await.expect("query");

    let key = |r: &localrag_core::QueryResult| {
        r.iter().map(|p| (p.chunk.id.clone(), p.score.to_bits())).collect::<Vec<_>>()
    };
    assert_eq!(key(&first), key(&second));
    // an earlier snapshot stays intact after the swap
    assert_eq!(old.len(), 2);
}

#[tokio::test]
async fn identical_chunk_text_is_embedded_once() {
    let embedder = Arc::new(VocabEmbedder::default());
    let mut p = pipeline(embedder.clone());
    let docs = [
        Document::new("a.txt", "cat sat", DocumentFormat::Text),
        Document::new("b.txt", "cat sat", DocumentFormat::Text),
    ];
    let report = p.ingest(&docs).await.expect("ingest");
    assert_eq!(report.chunks, 2);
    assert_eq!(report.embedded, 2);
    assert_eq!(report.cache_hits, 1);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);

    let result = p.query("cat").await.expect("query");
    let sources: Vec<_> = result.iter().map(|p| p.source.as_str()).collect();
    assert_eq!(sources, ["a.txt", "b.txt"]);
}

#[tokio::test]
async fn builds_from_settings_with_fake_embeddings() {
    let settings = Settings { use_fake_embeddings: true, ..Default::default() };
    let embedder = Arc::new(FakeEmbedder::new(settings.embedding.fake_dim));
    let mut p = RetrievalPipeline::from_settings(&settings, embedder).expect("pipeline");

    let text = "Rust ownership rules. ".repeat(120);
    let report = p.ingest(&[Document::new("rust.md", text, DocumentFormat::Markdown)]).await.expect("ingest");
    assert!(report.chunks > 1);
    assert_eq!(report.failed, 0);

    let result = p.query("ownership").await.expect("query");
    assert_eq!(result.path, RetrievalPath::Embedding);
    assert!(!result.is_empty() && result.len() <= settings.retrieval.top_k);
}

#[test]
fn rejects_invalid_configuration() {
    let embedder: Arc<dyn Embedder> = Arc::new(VocabEmbedder::default());
    assert!(RetrievalPipeline::new(ChunkingConfig::new(10, 10), 3, embedder.clone(), LexicalScorer::new(true)).is_err());
    assert!(RetrievalPipeline::new(ChunkingConfig::new(10, 2), 0, embedder, LexicalScorer::new(true)).is_err());
}
