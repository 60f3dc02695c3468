//! Embedding providers.
//!
//! `HttpEmbedder` talks to an OpenAI-compatible `/embeddings` endpoint;
//! `FakeEmbedder` produces deterministic hash vectors for tests and offline
//! development. Both normalise failures into `EmptyInput` /
//! `ProviderUnavailable` so the pipeline can degrade instead of abort.

use std::sync::Arc;

use localrag_core::config::{EmbeddingSettings, ProviderKind};
use localrag_core::traits::Embedder;
use localrag_core::Result;

pub mod fake;
pub mod http;

pub use fake::FakeEmbedder;
pub use http::HttpEmbedder;

pub fn embedder_from_settings(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    match settings.provider {
        ProviderKind::Fake => {
            tracing::info!("🧪 Using FakeEmbedder (dim {})", settings.fake_dim);
            Ok(Arc::new(FakeEmbedder::new(settings.fake_dim)))
        }
        ProviderKind::OpenAi => Ok(Arc::new(HttpEmbedder::from_settings(settings)?)),
    }
}
