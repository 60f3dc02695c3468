//! localrag-text
//!
//! Keyword-overlap retrieval used when embeddings are unavailable. Terms
//! come from a Tantivy analyzer (lowercased, optionally stop-word
//! filtered); see `lexical` for the scoring rule.

pub mod analyzer;
pub mod lexical;

pub use analyzer::TermAnalyzer;
pub use lexical::{LexicalRanker, LexicalScorer};
