//! Error types for the Markdown RAG CLI.

use thiserror::Error;

/// Errors related to document splitting.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("failed to read document: {0}")]
    FileReadError(String),

    #[error("invalid split marker: {0}")]
    InvalidMarker(String),
}

/// Errors related to remote embedding calls.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding backend: {0}")]
    ConnectionError(String),

    #[error("embedding backend error: {0}")]
    BackendError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("missing embedding API key (set MDRAG_EMBEDDING_API_KEY)")]
    MissingApiKey,

    #[error("embedding timeout")]
    Timeout,
}

/// Errors related to chat-completion calls.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to connect to chat backend: {0}")]
    ConnectionError(String),

    #[error("chat backend error: {0}")]
    BackendError(String),

    #[error("chat request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid chat response: {0}")]
    InvalidResponse(String),

    #[error("missing chat API key (set MDRAG_CHAT_API_KEY)")]
    MissingApiKey,

    #[error("chat timeout")]
    Timeout,
}

/// Errors related to the embedded vector store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store not found: {0}")]
    NotFound(String),

    #[error("invalid embedding vector: {0}")]
    InvalidVector(String),

    #[error("corrupt store: {0}")]
    Corrupt(String),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors related to document ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("split error: {0}")]
    SplitError(#[from] SplitError),

    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("no chunks produced from document")]
    NoChunks,
}

/// Errors related to retrieval and answer generation.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("chat error: {0}")]
    ChatError(#[from] ChatError),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("split error: {0}")]
    Split(#[from] SplitError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("query error: {0}")]
    Query(#[from] QueryError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Other(String),
}
