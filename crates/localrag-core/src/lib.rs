//! localrag-core
//!
//! Shared vocabulary of the retrieval engine: documents, chunks, ranked
//! passages, the error taxonomy, configuration and the seams (`Embedder`,
//! `Ranker`, `DocumentLoader`) the other crates plug into.

pub mod chunker;
pub mod config;
pub mod error;
pub mod extract;
pub mod loader;
pub mod traits;
pub mod types;

pub use chunker::{Chunker, ChunkingConfig};
pub use error::{Error, Result};
pub use types::{Chunk, Document, DocumentFormat, Embedding, IndexEntry, Passage, QueryResult, RetrievalPath};
