mod chat;
mod context;
mod embedding;
mod generation;
mod ingest;
mod retriever;
mod session;
mod splitter;
mod vector_store;

pub use chat::{ChatClient, ChatOutcome};
pub use context::{BuiltContext, MIN_TAIL_TOKENS, TOKENS_PER_CHAR, build_context};
pub use embedding::EmbeddingClient;
pub use generation::{AnswerStrategy, GenerationOutcome};
pub use ingest::{IngestStats, Ingestor};
pub use retriever::{RetrievalOutcome, Retriever};
pub use session::{Exchange, SessionStore};
pub use splitter::{
    ChunkStats, MarkdownSplitter, analyze_chunks, filter_by_size, find_by_title,
    save_chunks_to_json, search_by_keyword,
};
pub use vector_store::{StoreInfo, StoreManifest, VectorStore};

#[cfg(test)]
pub(crate) mod test_env {
    use std::sync::{Mutex, MutexGuard};

    // Serializes API-key env-var mutation across test modules.
    static LOCK: Mutex<()> = Mutex::new(());

    pub fn lock() -> MutexGuard<'static, ()> {
        LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }
}
