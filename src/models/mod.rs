mod chunk;
mod config;
mod report;

pub use chunk::{Chunk, EmbeddedChunk, ScoredChunk};
pub use config::{
    CHAT_API_KEY_VAR, ChatConfig, Config, DEFAULT_CHAT_MODEL, DEFAULT_CHAT_URL,
    DEFAULT_EMBEDDING_DIMENSION, DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL,
    DEFAULT_SPLIT_MARKER, DEFAULT_STORE_NAME, EMBEDDING_API_KEY_VAR, EmbeddingConfig,
    GenerationConfig, OutputConfig, RetrievalConfig, SplitConfig, StoreConfig, StrategyKind,
};
pub use report::{AskReport, BatchReport, BatchSummary, LlmInfo, OutputFormat, RetrievedDoc};
