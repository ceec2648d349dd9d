//! Embedded vector store backed by SQLite.
//!
//! A store is a directory (keyed by database name) containing a single
//! `index.db`. Vectors are stored as little-endian f32 blobs and searched
//! with a brute-force cosine scan; at the chunk counts this tool handles,
//! a linear scan is faster than any index would pay for.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::models::{Chunk, EmbeddedChunk, ScoredChunk};

const DB_FILE: &str = "index.db";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS manifest (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS chunks (
    id          TEXT PRIMARY KEY,
    chunk_index INTEGER NOT NULL,
    title       TEXT NOT NULL,
    content     TEXT NOT NULL,
    level       INTEGER NOT NULL,
    start_line  INTEGER NOT NULL,
    end_line    INTEGER NOT NULL,
    char_count  INTEGER NOT NULL,
    word_count  INTEGER NOT NULL,
    vector      BLOB NOT NULL
);
";

/// Provenance recorded at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreManifest {
    pub source_file: String,
    pub source_checksum: String,
    pub split_marker: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub created_at: String,
}

impl StoreManifest {
    pub fn new(
        source_file: impl Into<String>,
        source_checksum: impl Into<String>,
        split_marker: impl Into<String>,
        embedding_model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            source_checksum: source_checksum.into(),
            split_marker: split_marker.into(),
            embedding_model: embedding_model.into(),
            dimension,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Summary of a store as shown by `status`.
#[derive(Debug, Clone, Serialize)]
pub struct StoreInfo {
    pub path: PathBuf,
    pub total_chunks: usize,
    pub size_mb: f64,
    pub manifest: StoreManifest,
}

/// Handle to one store directory.
pub struct VectorStore {
    conn: Connection,
    dir: PathBuf,
    dimension: usize,
}

impl VectorStore {
    /// Create a fresh store at `dir`, replacing any existing one.
    ///
    /// Re-ingestion always starts from an empty store so that chunks
    /// removed from the source document cannot linger as stale hits.
    pub fn recreate(dir: &Path, manifest: StoreManifest) -> Result<Self, StoreError> {
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        std::fs::create_dir_all(dir)?;

        let conn = Connection::open(dir.join(DB_FILE))?;
        conn.execute_batch(SCHEMA)?;

        let dimension = manifest.dimension;
        let store = Self {
            conn,
            dir: dir.to_path_buf(),
            dimension,
        };
        store.write_manifest(&manifest)?;
        Ok(store)
    }

    /// Open an existing store; errors if the directory or database is absent.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        let db_path = dir.join(DB_FILE);
        if !db_path.exists() {
            return Err(StoreError::NotFound(dir.display().to_string()));
        }

        let conn = Connection::open(&db_path)?;
        let dimension: usize = conn
            .query_row(
                "SELECT value FROM manifest WHERE key = 'dimension'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| StoreError::Corrupt("manifest has no dimension".to_string()))?;

        Ok(Self {
            conn,
            dir: dir.to_path_buf(),
            dimension,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn write_manifest(&self, manifest: &StoreManifest) -> Result<(), StoreError> {
        let pairs: [(&str, String); 6] = [
            ("source_file", manifest.source_file.clone()),
            ("source_checksum", manifest.source_checksum.clone()),
            ("split_marker", manifest.split_marker.clone()),
            ("embedding_model", manifest.embedding_model.clone()),
            ("dimension", manifest.dimension.to_string()),
            ("created_at", manifest.created_at.clone()),
        ];
        for (key, value) in pairs {
            self.conn.execute(
                "INSERT OR REPLACE INTO manifest (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }
        Ok(())
    }

    pub fn manifest(&self) -> Result<StoreManifest, StoreError> {
        let get = |key: &str| -> Result<String, StoreError> {
            self.conn
                .query_row(
                    "SELECT value FROM manifest WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| StoreError::Corrupt(format!("manifest has no {}", key)))
        };

        Ok(StoreManifest {
            source_file: get("source_file")?,
            source_checksum: get("source_checksum")?,
            split_marker: get("split_marker")?,
            embedding_model: get("embedding_model")?,
            dimension: self.dimension,
            created_at: get("created_at")?,
        })
    }

    /// Insert embedded chunks in one transaction.
    pub fn insert_chunks(&mut self, chunks: &[EmbeddedChunk]) -> Result<(), StoreError> {
        for chunk in chunks {
            if chunk.vector.len() != self.dimension {
                return Err(StoreError::InvalidVector(format!(
                    "{}: expected dimension {}, got {}",
                    chunk.id,
                    self.dimension,
                    chunk.vector.len()
                )));
            }
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO chunks \
                 (id, chunk_index, title, content, level, start_line, end_line, \
                  char_count, word_count, vector) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for chunk in chunks {
                stmt.execute(params![
                    chunk.id,
                    chunk.chunk_index as i64,
                    chunk.chunk.title,
                    chunk.chunk.content,
                    chunk.chunk.level as i64,
                    chunk.chunk.start_line as i64,
                    chunk.chunk.end_line as i64,
                    chunk.chunk.char_count as i64,
                    chunk.chunk.word_count as i64,
                    encode_vector(&chunk.vector),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Top-k nearest chunks by cosine distance, ascending.
    ///
    /// Returns fewer than `k` results when the store holds fewer chunks.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, StoreError> {
        if query.len() != self.dimension {
            return Err(StoreError::InvalidVector(format!(
                "query: expected dimension {}, got {}",
                self.dimension,
                query.len()
            )));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, level, start_line, end_line, vector \
             FROM chunks ORDER BY chunk_index",
        )?;

        let mut scored: Vec<ScoredChunk> = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let title: String = row.get(1)?;
            let content: String = row.get(2)?;
            let level: i64 = row.get(3)?;
            let start_line: i64 = row.get(4)?;
            let end_line: i64 = row.get(5)?;
            let blob: Vec<u8> = row.get(6)?;

            let vector = decode_vector(&blob)
                .ok_or_else(|| StoreError::Corrupt(format!("malformed vector blob for {}", id)))?;
            if vector.len() != self.dimension {
                return Err(StoreError::Corrupt(format!(
                    "{}: stored dimension {} does not match manifest {}",
                    id,
                    vector.len(),
                    self.dimension
                )));
            }

            let distance = cosine_distance(query, &vector);
            scored.push(ScoredChunk {
                id,
                chunk: Chunk::new(
                    title,
                    content,
                    level as usize,
                    start_line as usize,
                    end_line as usize,
                ),
                similarity_score: 1.0 - distance,
                distance_score: distance,
            });
        }

        scored.sort_by(|a, b| {
            a.distance_score
                .partial_cmp(&b.distance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Store summary for the status command.
    pub fn info(&self) -> Result<StoreInfo, StoreError> {
        Ok(StoreInfo {
            path: self.dir.clone(),
            total_chunks: self.count()?,
            size_mb: directory_size_bytes(&self.dir)? as f64 / (1024.0 * 1024.0),
            manifest: self.manifest()?,
        })
    }
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn decode_vector(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    )
}

/// Cosine distance clamped to [0, 1] so that `1 - distance` is a usable
/// similarity. Zero vectors score as maximally distant.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    (1.0 - similarity).clamp(0.0, 1.0)
}

fn directory_size_bytes(dir: &Path) -> Result<u64, StoreError> {
    let mut total = 0u64;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_file() {
            total += metadata.len();
        } else if metadata.is_dir() {
            total += directory_size_bytes(&entry.path())?;
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_manifest(dimension: usize) -> StoreManifest {
        StoreManifest::new("doc.md", "abc123", "###", "test-model", dimension)
    }

    fn embedded(index: usize, title: &str, vector: Vec<f32>) -> EmbeddedChunk {
        let chunk = Chunk::new(
            title.to_string(),
            format!("### {}\nbody", title),
            3,
            1,
            2,
        );
        EmbeddedChunk::new("test", index, chunk, vector)
    }

    #[test]
    fn test_recreate_insert_count() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("store.db");

        let mut store = VectorStore::recreate(&dir, test_manifest(3)).unwrap();
        store
            .insert_chunks(&[
                embedded(0, "a", vec![1.0, 0.0, 0.0]),
                embedded(1, "b", vec![0.0, 1.0, 0.0]),
            ])
            .unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_recreate_wipes_previous_contents() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("store.db");

        let mut store = VectorStore::recreate(&dir, test_manifest(3)).unwrap();
        store
            .insert_chunks(&[embedded(0, "old", vec![1.0, 0.0, 0.0])])
            .unwrap();
        drop(store);

        let store = VectorStore::recreate(&dir, test_manifest(3)).unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_open_missing_store() {
        let tmp = TempDir::new().unwrap();
        let result = VectorStore::open(&tmp.path().join("absent.db"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_search_orders_by_distance() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("store.db");

        let mut store = VectorStore::recreate(&dir, test_manifest(3)).unwrap();
        store
            .insert_chunks(&[
                embedded(0, "orthogonal", vec![0.0, 1.0, 0.0]),
                embedded(1, "exact", vec![1.0, 0.0, 0.0]),
                embedded(2, "close", vec![0.9, 0.1, 0.0]),
            ])
            .unwrap();

        let hits = store.search(&[1.0, 0.0, 0.0], 3).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].chunk.title, "exact");
        assert_eq!(hits[1].chunk.title, "close");
        assert_eq!(hits[2].chunk.title, "orthogonal");
        assert!(hits[0].distance_score <= hits[1].distance_score);
        assert!(hits[1].distance_score <= hits[2].distance_score);
        assert!((hits[0].similarity_score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_search_k_exceeds_store_size() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("store.db");

        let mut store = VectorStore::recreate(&dir, test_manifest(3)).unwrap();
        store
            .insert_chunks(&[
                embedded(0, "a", vec![1.0, 0.0, 0.0]),
                embedded(1, "b", vec![0.0, 1.0, 0.0]),
            ])
            .unwrap();

        let hits = store.search(&[1.0, 0.0, 0.0], 5).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_search_rejects_wrong_dimension() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("store.db");
        let store = VectorStore::recreate(&dir, test_manifest(3)).unwrap();
        assert!(matches!(
            store.search(&[1.0, 0.0], 3),
            Err(StoreError::InvalidVector(_))
        ));
    }

    #[test]
    fn test_insert_rejects_wrong_dimension() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("store.db");
        let mut store = VectorStore::recreate(&dir, test_manifest(3)).unwrap();
        assert!(matches!(
            store.insert_chunks(&[embedded(0, "bad", vec![1.0])]),
            Err(StoreError::InvalidVector(_))
        ));
    }

    #[test]
    fn test_persistence_round_trip() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("store.db");

        {
            let mut store = VectorStore::recreate(&dir, test_manifest(3)).unwrap();
            store
                .insert_chunks(&[embedded(0, "persisted", vec![0.5, 0.5, 0.0])])
                .unwrap();
        }

        let store = VectorStore::open(&dir).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.dimension(), 3);

        let manifest = store.manifest().unwrap();
        assert_eq!(manifest.source_file, "doc.md");
        assert_eq!(manifest.embedding_model, "test-model");

        let hits = store.search(&[0.5, 0.5, 0.0], 1).unwrap();
        assert_eq!(hits[0].chunk.title, "persisted");
        assert_eq!(hits[0].id, "test_000");
    }

    #[test]
    fn test_vector_codec() {
        let original = vec![0.1f32, -2.5, 1e-7, 42.0];
        let decoded = decode_vector(&encode_vector(&original)).unwrap();
        assert_eq!(original, decoded);
        assert!(decode_vector(&[1, 2, 3]).is_none());
    }

    #[test]
    fn test_cosine_distance_bounds() {
        assert!((cosine_distance(&[1.0, 0.0], &[1.0, 0.0])).abs() < 1e-6);
        // Opposed vectors clamp to 1 so similarity stays non-negative.
        assert_eq!(cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]), 1.0);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn test_info_reports_size() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("store.db");
        let mut store = VectorStore::recreate(&dir, test_manifest(3)).unwrap();
        store
            .insert_chunks(&[embedded(0, "a", vec![1.0, 0.0, 0.0])])
            .unwrap();

        let info = store.info().unwrap();
        assert_eq!(info.total_chunks, 1);
        assert!(info.size_mb > 0.0);
        assert_eq!(info.manifest.split_marker, "###");
    }
}
