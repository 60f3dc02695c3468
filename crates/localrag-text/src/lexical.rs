use std::collections::BTreeSet;

use localrag_core::traits::Ranker;
use localrag_core::{Error, IndexEntry, QueryResult, Result, RetrievalPath};

use crate::analyzer::TermAnalyzer;

/// Scores a chunk by the fraction of distinct query terms it contains.
///
/// Crude on purpose: it keeps questions answerable while the embedding
/// provider is down. Chunks sharing no term with the query are left out,
/// and ranking follows the same rules as the vector index (descending
/// score, ingestion order on ties, at most `k`).
#[derive(Clone, Default)]
pub struct LexicalScorer {
	analyzer: TermAnalyzer,
}

impl LexicalScorer {
	pub fn new(exclude_stop_words: bool) -> Self { Self { analyzer: TermAnalyzer::new(exclude_stop_words) } }

	pub fn analyzer(&self) -> &TermAnalyzer { &self.analyzer }

	/// Overlap in `[0, 1]` between prepared query terms and `text`.
	pub fn score(&self, query_terms: &BTreeSet<String>, text: &str) -> f32 {
		if query_terms.is_empty() { return 0.0; }
		let chunk_terms = self.analyzer.terms(text);
		let hits = query_terms.iter().filter(|t| chunk_terms.contains(*t)).count();
		hits as f32 / query_terms.len() as f32
	}

	pub fn search(&self, query: &str, entries: &[IndexEntry], k: usize) -> Result<QueryResult> {
		if k == 0 { return Err(Error::Config("k must be at least 1".into())); }
		let query_terms = self.analyzer.query_terms(query);
		if query_terms.is_empty() { return Err(Error::EmptyInput); }
		let candidates = entries
			.iter()
			.filter_map(|e| {
				let s = self.score(&query_terms, &e.chunk.text);
				(s > 0.0).then(|| e.passage(s))
			})
			.collect();
		let result = QueryResult::ranked(RetrievalPath::Lexical, candidates, k);
		tracing::debug!(terms = query_terms.len(), hits = result.len(), "lexical search");
		Ok(result)
	}

	/// Bind the scorer to a set of entries, giving it the shared
	/// `Ranker` surface.
	pub fn over<'a>(&'a self, entries: &'a [IndexEntry]) -> LexicalRanker<'a> { LexicalRanker { scorer: self, entries } }
}

pub struct LexicalRanker<'a> {
	scorer: &'a LexicalScorer,
	entries: &'a [IndexEntry],
}

impl Ranker for LexicalRanker<'_> {
	type Query = str;

	fn path(&self) -> RetrievalPath { RetrievalPath::Lexical }

	fn search(&self, query: &str, k: usize) -> Result<QueryResult> { self.scorer.search(query, self.entries, k) }
}
