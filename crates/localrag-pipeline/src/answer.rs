use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use localrag_core::config::GenerationSettings;
use localrag_core::{Error, QueryResult, Result, RetrievalPath};

use crate::prompt::{build_prompt, NO_CONTEXT_ANSWER, SYSTEM_PROMPT};

/// Turns retrieved passages into answer text.
#[async_trait]
pub trait Generator: Send + Sync {
    fn id(&self) -> &str;

    async fn generate(&self, question: &str, result: &QueryResult) -> Result<String>;
}

/// Lists the retrieved passages verbatim. Never fails; used when no model
/// is configured or the model call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveGenerator;

impl ExtractiveGenerator {
    pub fn render(question: &str, result: &QueryResult) -> String {
        if result.is_empty() {
            return NO_CONTEXT_ANSWER.to_string();
        }
        let mut out = format!("Based on the available information, here's what I found about '{question}':\n\n");
        for (i, p) in result.iter().enumerate() {
            out.push_str(&format!(
                "{}. From {} (chars {}..{}):\n{}\n\n",
                i + 1,
                p.source,
                p.chunk.span.start,
                p.chunk.span.end,
                p.chunk.text
            ));
        }
        out.push_str("Note: this is an extractive summary of the retrieved passages; no language model was used.");
        if result.path == RetrievalPath::Lexical {
            out.push_str(" Passages were ranked by keyword overlap because embeddings were unavailable.");
        }
        out
    }
}

#[async_trait]
impl Generator for ExtractiveGenerator {
    fn id(&self) -> &str {
        "extractive"
    }

    async fn generate(&self, question: &str, result: &QueryResult) -> Result<String> {
        Ok(Self::render(question, result))
    }
}

/// OpenAI-compatible chat-completions client.
pub struct ChatGenerator {
    id: String,
    url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl ChatGenerator {
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            id: format!("openai:{}", settings.model),
            url: format!("{}/chat/completions", settings.endpoint.trim_end_matches('/')),
            model: settings.model.clone(),
            api_key: settings.resolved_api_key(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            client,
        })
    }
}

#[async_trait]
impl Generator for ChatGenerator {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, question: &str, result: &QueryResult) -> Result<String> {
        if result.is_empty() {
            return Ok(NO_CONTEXT_ANSWER.to_string());
        }
        let prompt = build_prompt(question, result);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &prompt },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let mut req = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| Error::ProviderUnavailable(format!("{} request failed: {e}", self.url)))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::ProviderUnavailable(format!(
                "{} returned {status}: {}",
                self.url,
                text.chars().take(200).collect::<String>()
            )));
        }
        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| Error::ProviderUnavailable(format!("malformed completion response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::ProviderUnavailable("completion response contained no text".into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Model,
    Extractive,
}

/// Final answer with the retrieval result it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub question: String,
    pub text: String,
    pub generated_by: AnswerSource,
    pub result: QueryResult,
}

impl Answer {
    pub fn path(&self) -> RetrievalPath {
        self.result.path
    }
}

/// Runs the configured generator and falls back to the extractive summary
/// when it fails.
#[derive(Clone, Default)]
pub struct Responder {
    generator: Option<Arc<dyn Generator>>,
}

impl Responder {
    pub fn extractive() -> Self {
        Self::default()
    }

    pub fn with_generator(generator: Arc<dyn Generator>) -> Self {
        Self { generator: Some(generator) }
    }

    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        if !settings.enabled {
            tracing::info!("answer generation disabled; using extractive summaries");
            return Ok(Self::extractive());
        }
        if settings.resolved_api_key().is_none() {
            tracing::warn!("no generation API key configured; using extractive summaries");
            return Ok(Self::extractive());
        }
        Ok(Self::with_generator(Arc::new(ChatGenerator::from_settings(settings)?)))
    }

    pub async fn respond(&self, question: &str, result: QueryResult) -> Answer {
        let generated = match &self.generator {
            Some(g) if !result.is_empty() => match g.generate(question, &result).await {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!(generator = g.id(), error = %e, "answer generation failed; using extractive summary");
                    None
                }
            },
            _ => None,
        };
        let (text, generated_by) = match generated {
            Some(text) => (text, AnswerSource::Model),
            None => (ExtractiveGenerator::render(question, &result), AnswerSource::Extractive),
        };
        Answer { question: question.to_string(), text, generated_by, result }
    }
}
