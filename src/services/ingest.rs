//! Split, embed and store a Markdown document.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::IngestError;
use crate::models::{Config, EmbeddedChunk};
use crate::services::embedding::EmbeddingClient;
use crate::services::splitter::MarkdownSplitter;
use crate::services::vector_store::{StoreManifest, VectorStore};

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestStats {
    pub source_file: String,
    pub store_path: PathBuf,
    pub total_chunks: usize,
    pub batches: usize,
    pub dimension: usize,
    pub elapsed_ms: u64,
}

/// Runs the split -> embed -> store pipeline for one document.
///
/// Embedding calls go out in fixed-size groups with a fixed pause between
/// them to stay under the backend's rate limit. A failed call aborts the
/// whole run; the target store has already been wiped at that point, so
/// the caller should re-run ingestion rather than patch up a partial one.
pub struct Ingestor {
    splitter: MarkdownSplitter,
    embedder: EmbeddingClient,
    batch_size: usize,
    batch_pause: Duration,
    id_prefix: String,
}

impl Ingestor {
    pub fn new(config: &Config, embedder: EmbeddingClient) -> Self {
        Self {
            splitter: MarkdownSplitter::new(&config.split),
            embedder,
            batch_size: config.embedding.batch_size.max(1),
            batch_pause: Duration::from_secs(config.embedding.batch_pause_secs),
            id_prefix: config.store.id_prefix.clone(),
        }
    }

    pub async fn ingest(
        &self,
        source: &Path,
        store_dir: &Path,
        show_progress: bool,
    ) -> Result<IngestStats, IngestError> {
        let started = Instant::now();

        let content = std::fs::read_to_string(source).map_err(|e| {
            IngestError::SplitError(crate::error::SplitError::FileReadError(format!(
                "{}: {}",
                source.display(),
                e
            )))
        })?;
        let checksum = sha256_hex(content.as_bytes());

        let chunks = self.splitter.split(&content)?;
        if chunks.is_empty() {
            return Err(IngestError::NoChunks);
        }

        let manifest = StoreManifest::new(
            source.display().to_string(),
            checksum,
            self.splitter.marker(),
            self.embedder.model(),
            self.embedder.dimension(),
        );
        let mut store = VectorStore::recreate(store_dir, manifest)?;

        let progress = if show_progress {
            let bar = ProgressBar::new(chunks.len() as u64);
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} chunks ({msg})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
            );
            Some(bar)
        } else {
            None
        };

        let groups: Vec<&[crate::models::Chunk]> = chunks.chunks(self.batch_size).collect();
        let batches = groups.len();
        let mut next_index = 0usize;

        for (group_no, group) in groups.into_iter().enumerate() {
            if let Some(bar) = &progress {
                bar.set_message(format!("batch {}/{}", group_no + 1, batches));
            }

            let texts: Vec<String> = group.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.embed_many(texts).await?;

            let embedded: Vec<EmbeddedChunk> = group
                .iter()
                .zip(vectors)
                .map(|(chunk, vector)| {
                    let item =
                        EmbeddedChunk::new(&self.id_prefix, next_index, chunk.clone(), vector);
                    next_index += 1;
                    item
                })
                .collect();
            store.insert_chunks(&embedded)?;

            if let Some(bar) = &progress {
                bar.inc(group.len() as u64);
            }

            // Pause between groups, not after the last one.
            if group_no + 1 < batches && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        if let Some(bar) = &progress {
            bar.finish_with_message("done");
        }

        Ok(IngestStats {
            source_file: source.display().to_string(),
            store_path: store_dir.to_path_buf(),
            total_chunks: chunks.len(),
            batches,
            dimension: self.embedder.dimension(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_value() {
        // Standard test vector for an empty input.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(sha256_hex(b"a"), sha256_hex(b"b"));
    }
}
