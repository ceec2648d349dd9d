//! Query-time retrieval: embed the query, scan the store.

use std::time::Instant;

use crate::error::QueryError;
use crate::models::ScoredChunk;
use crate::services::embedding::EmbeddingClient;
use crate::services::vector_store::VectorStore;

/// Retrieval hits plus timing for run reports.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub hits: Vec<ScoredChunk>,
    pub retrieval_ms: u64,
}

/// Nearest-neighbour retrieval over one open store.
///
/// Hits come back exactly as the store ranks them; there is no
/// re-ranking or score threshold on top.
pub struct Retriever<'a> {
    embedder: &'a EmbeddingClient,
    store: &'a VectorStore,
}

impl<'a> Retriever<'a> {
    pub fn new(embedder: &'a EmbeddingClient, store: &'a VectorStore) -> Self {
        Self { embedder, store }
    }

    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalOutcome, QueryError> {
        if query.trim().is_empty() {
            return Err(QueryError::InvalidQuery("query is empty".to_string()));
        }

        let started = Instant::now();
        let vector = self.embedder.embed_one(query).await?;
        let hits = self.store.search(&vector, k)?;

        Ok(RetrievalOutcome {
            hits,
            retrieval_ms: started.elapsed().as_millis() as u64,
        })
    }
}
