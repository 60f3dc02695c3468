use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Empty input: text is empty or whitespace-only")]
    EmptyInput,

    #[error("Embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Index is empty: no chunks were produced from the supplied documents")]
    IndexEmpty,

    #[error("Pipeline is not ready: ingest documents before querying")]
    NotReady,

    #[error("No embedded entries: the index cannot rank by similarity")]
    NoEmbeddings,

    #[error("Embedding dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Query-time failures that degrade to lexical ranking instead of
    /// surfacing to the caller.
    pub fn is_fallback_trigger(&self) -> bool {
        matches!(self, Self::ProviderUnavailable(_) | Self::NoEmbeddings | Self::DimensionMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
