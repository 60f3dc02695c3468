use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use localrag_core::config::EmbeddingSettings;
use localrag_core::traits::Embedder;
use localrag_core::{Embedding, Error, Result};

/// OpenAI-compatible embedding client.
///
/// Every request is bounded by the client timeout. Transient failures
/// (timeouts, connection errors, 429, 5xx) are retried at most
/// `max_retries` times with doubling backoff; auth errors and malformed
/// responses fail straight away. Whatever is left surfaces as
/// `ProviderUnavailable`.
pub struct HttpEmbedder {
    id: String,
    url: String,
    model: String,
    api_key: Option<String>,
    max_retries: u32,
    backoff: Duration,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

enum Failure {
    Transient(String),
    Fatal(String),
}

impl HttpEmbedder {
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        let api_key = settings.resolved_api_key();
        if api_key.is_none() {
            tracing::warn!("no embedding API key configured; requests are sent unauthenticated");
        }
        Ok(Self {
            id: format!("openai:{}", settings.model),
            url: format!("{}/embeddings", settings.endpoint.trim_end_matches('/')),
            model: settings.model.clone(),
            api_key,
            max_retries: settings.max_retries,
            backoff: Duration::from_millis(settings.retry_backoff_ms),
            client,
        })
    }

    async fn request_once(&self, text: &str) -> std::result::Result<Embedding, Failure> {
        let mut req = self.client.post(&self.url).json(&EmbeddingRequest { model: &self.model, input: text });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.map_err(|e| {
            let kind = if e.is_timeout() { "timed out" } else { "request failed" };
            Failure::Transient(format!("{} {kind}: {e}", self.url))
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let reason = format!("{} returned {status}: {}", self.url, body.chars().take(200).collect::<String>());
            return Err(if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                Failure::Transient(reason)
            } else {
                Failure::Fatal(reason)
            });
        }

        let parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| Failure::Fatal(format!("malformed embedding response: {e}")))?;
        match parsed.data.into_iter().next() {
            Some(d) if !d.embedding.is_empty() => Ok(d.embedding),
            _ => Err(Failure::Fatal("embedding response contained no vector".into())),
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn id(&self) -> &str {
        &self.id
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        let mut attempt = 0u32;
        loop {
            match self.request_once(text).await {
                Ok(v) => return Ok(v),
                Err(Failure::Transient(reason)) if attempt < self.max_retries => {
                    let delay = self.backoff.saturating_mul(1 << attempt.min(16));
                    attempt += 1;
                    tracing::warn!(attempt, delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), %reason, "embedding request failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(Failure::Transient(reason) | Failure::Fatal(reason)) => {
                    return Err(Error::ProviderUnavailable(reason));
                }
            }
        }
    }
}
