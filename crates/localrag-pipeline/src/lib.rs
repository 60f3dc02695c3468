//! Retrieval pipeline: ingest documents into an in-memory index once, then
//! answer each question from it, by embedding similarity when the provider
//! is healthy and by keyword overlap when it is not.

pub mod answer;
pub mod pipeline;
pub mod prompt;

pub use answer::{Answer, AnswerSource, ChatGenerator, ExtractiveGenerator, Generator, Responder};
pub use pipeline::{IngestReport, PipelineState, RetrievalPipeline};
