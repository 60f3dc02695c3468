use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::types::{Document, Embedding, QueryResult, RetrievalPath};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g., `openai:text-embedding-ada-002`).
    fn id(&self) -> &str;

    /// Embed one text. Fails with `EmptyInput` on blank text and with
    /// `ProviderUnavailable` once the provider's bounded retries are spent.
    async fn embed(&self, text: &str) -> Result<Embedding>;
}

/// A ranking strategy: the vector index and the lexical fallback both
/// answer `search(query, k)` with an ordered `QueryResult`.
pub trait Ranker {
    type Query: ?Sized;

    fn path(&self) -> RetrievalPath;

    fn search(&self, query: &Self::Query, k: usize) -> Result<QueryResult>;
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Document>;
}
