use serde::{Deserialize, Serialize};

/// One heading-delimited section of a Markdown document.
///
/// Created by the splitter in a single document pass and immutable
/// afterwards. Two identical headings produce two distinct chunks;
/// uniqueness is not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Heading text with the marker prefix stripped.
    pub title: String,
    /// Trimmed section text, including its own heading line.
    pub content: String,
    /// Heading level, i.e. the marker length in characters.
    pub level: usize,
    /// 1-based line number of the heading line.
    pub start_line: usize,
    /// 1-based line number of the last line before the next heading
    /// (or the document's line count for the final chunk).
    pub end_line: usize,
    /// UTF-8 byte length of the trimmed content.
    pub char_count: usize,
    /// Character length of the trimmed content.
    pub word_count: usize,
}

impl Chunk {
    pub fn new(
        title: String,
        content: String,
        level: usize,
        start_line: usize,
        end_line: usize,
    ) -> Self {
        let char_count = content.len();
        let word_count = content.chars().count();
        Self {
            title,
            content,
            level,
            start_line,
            end_line,
            char_count,
            word_count,
        }
    }
}

/// A chunk plus its embedding vector and generated store identifier.
///
/// Owned by the vector store; the set of embedded chunks is a snapshot of
/// the source document at ingestion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub id: String,
    pub chunk_index: usize,
    pub chunk: Chunk,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub vector: Vec<f32>,
}

impl EmbeddedChunk {
    /// Store identifiers follow the `{prefix}_{index:03}` scheme.
    pub fn generate_id(prefix: &str, chunk_index: usize) -> String {
        format!("{}_{:03}", prefix, chunk_index)
    }

    pub fn new(prefix: &str, chunk_index: usize, chunk: Chunk, vector: Vec<f32>) -> Self {
        Self {
            id: Self::generate_id(prefix, chunk_index),
            chunk_index,
            chunk,
            vector,
        }
    }
}

/// One retrieval hit, ephemeral per search call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: String,
    pub chunk: Chunk,
    /// Similarity in [0, 1], derived as `1 - distance`.
    pub similarity_score: f32,
    /// Normalized distance in [0, 1]; results are ordered ascending by this.
    pub distance_score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_counts() {
        let chunk = Chunk::new("标题".into(), "### 标题\nab".into(), 3, 1, 2);
        // char_count is UTF-8 bytes, word_count is characters.
        assert_eq!(chunk.char_count, "### 标题\nab".len());
        assert_eq!(chunk.word_count, "### 标题\nab".chars().count());
        assert!(chunk.char_count > chunk.word_count);
    }

    #[test]
    fn test_embedded_chunk_id_format() {
        assert_eq!(EmbeddedChunk::generate_id("im_docs", 0), "im_docs_000");
        assert_eq!(EmbeddedChunk::generate_id("im_docs", 42), "im_docs_042");
        assert_eq!(EmbeddedChunk::generate_id("im_docs", 1000), "im_docs_1000");
    }
}
