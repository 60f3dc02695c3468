use std::collections::HashMap;

use localrag_core::Embedding;

fn hash_content(s: &str) -> String {
    let h = blake3::hash(s.as_bytes());
    h.to_hex().to_string()
}

/// Content-addressed embeddings for one embedder, so identical chunk text
/// (repeated headers, boilerplate) is sent to the provider once.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    embedder_id: String,
    vectors: HashMap<String, Embedding>,
}

impl EmbeddingCache {
    pub fn new(embedder_id: impl Into<String>) -> Self {
        Self { embedder_id: embedder_id.into(), vectors: HashMap::new() }
    }

    pub fn embedder_id(&self) -> &str {
        &self.embedder_id
    }

    pub fn get(&self, text: &str) -> Option<&Embedding> {
        self.vectors.get(&hash_content(text))
    }

    pub fn insert(&mut self, text: &str, embedding: Embedding) {
        self.vectors.insert(hash_content(text), embedding);
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}
