//! In-memory vector index.
//!
//! Entries are kept in ingestion order; `search` ranks every stored
//! embedding by cosine similarity against the query. The index is built
//! once and only read afterwards, so it needs no locking when shared
//! behind an `Arc`.

pub mod cache;
pub mod index;
pub mod similarity;

pub use cache::EmbeddingCache;
pub use index::VectorIndex;
pub use similarity::{cosine_similarity, magnitude};
