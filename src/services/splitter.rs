//! Heading-delimited Markdown splitting for the RAG pipeline.

use std::path::Path;

use serde::Serialize;

use crate::error::SplitError;
use crate::models::{Chunk, SplitConfig};

/// Splits a Markdown document into sections at a fixed heading level.
#[derive(Debug, Clone)]
pub struct MarkdownSplitter {
    marker: String,
}

impl MarkdownSplitter {
    pub fn new(config: &SplitConfig) -> Self {
        Self {
            marker: config.marker.clone(),
        }
    }

    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Read a document from disk and split it.
    pub fn split_file(&self, path: &Path) -> Result<Vec<Chunk>, SplitError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SplitError::FileReadError(format!("{}: {}", path.display(), e)))?;
        self.split(&content)
    }

    /// Split raw document text into ordered chunks.
    ///
    /// A chunk starts at every line beginning with `marker + " "` and runs to
    /// the line before the next such heading; the final chunk runs to
    /// end-of-document. Each chunk's content includes its own heading line.
    /// Lines before the first heading are discarded silently — callers that
    /// care about a preamble must handle it themselves. A document with no
    /// matching heading yields an empty vec.
    pub fn split(&self, text: &str) -> Result<Vec<Chunk>, SplitError> {
        if self.marker.is_empty() {
            return Err(SplitError::InvalidMarker("marker is empty".to_string()));
        }

        let prefix = format!("{} ", self.marker);
        let level = self.marker.chars().count();
        let lines: Vec<&str> = text.split('\n').collect();

        let mut chunks = Vec::new();
        let mut chunk_lines: Vec<&str> = Vec::new();
        let mut current_title = String::new();
        let mut chunk_start_line = 0usize;

        for (i, line) in lines.iter().enumerate() {
            if let Some(heading) = line.strip_prefix(&prefix) {
                if !chunk_lines.is_empty() && !current_title.is_empty() {
                    push_chunk(
                        &mut chunks,
                        &current_title,
                        &chunk_lines,
                        level,
                        chunk_start_line + 1,
                        i,
                    );
                }

                current_title = heading.trim().to_string();
                chunk_lines = vec![line];
                chunk_start_line = i;
            } else {
                chunk_lines.push(line);
            }
        }

        if !chunk_lines.is_empty() && !current_title.is_empty() {
            push_chunk(
                &mut chunks,
                &current_title,
                &chunk_lines,
                level,
                chunk_start_line + 1,
                lines.len(),
            );
        }

        Ok(chunks)
    }
}

fn push_chunk(
    chunks: &mut Vec<Chunk>,
    title: &str,
    lines: &[&str],
    level: usize,
    start_line: usize,
    end_line: usize,
) {
    let content = lines.join("\n").trim().to_string();
    if content.is_empty() {
        return;
    }
    chunks.push(Chunk::new(
        title.to_string(),
        content,
        level,
        start_line,
        end_line,
    ));
}

/// Aggregate statistics over a chunk sequence.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChunkStats {
    pub total_chunks: usize,
    pub total_characters: usize,
    pub total_words: usize,
    pub avg_chunk_size: usize,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
}

pub fn analyze_chunks(chunks: &[Chunk]) -> ChunkStats {
    if chunks.is_empty() {
        return ChunkStats::default();
    }

    let total_characters: usize = chunks.iter().map(|c| c.char_count).sum();
    let total_words: usize = chunks.iter().map(|c| c.word_count).sum();

    ChunkStats {
        total_chunks: chunks.len(),
        total_characters,
        total_words,
        avg_chunk_size: total_characters / chunks.len(),
        min_chunk_size: chunks.iter().map(|c| c.char_count).min().unwrap_or(0),
        max_chunk_size: chunks.iter().map(|c| c.char_count).max().unwrap_or(0),
    }
}

/// First chunk with an exactly matching title.
pub fn find_by_title<'a>(chunks: &'a [Chunk], title: &str) -> Option<&'a Chunk> {
    chunks.iter().find(|c| c.title == title)
}

/// Chunks whose title or content contains the keyword (case-insensitive).
pub fn search_by_keyword<'a>(chunks: &'a [Chunk], keyword: &str) -> Vec<&'a Chunk> {
    let needle = keyword.to_lowercase();
    chunks
        .iter()
        .filter(|c| {
            c.content.to_lowercase().contains(&needle) || c.title.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Chunks within the given `char_count` bounds (inclusive).
pub fn filter_by_size(chunks: &[Chunk], min_chars: usize, max_chars: usize) -> Vec<&Chunk> {
    chunks
        .iter()
        .filter(|c| c.char_count >= min_chars && c.char_count <= max_chars)
        .collect()
}

/// Write chunks to a JSON file with a small metadata envelope.
pub fn save_chunks_to_json(
    chunks: &[Chunk],
    output: &Path,
    source_file: &str,
    marker: &str,
) -> Result<(), SplitError> {
    let envelope = serde_json::json!({
        "metadata": {
            "total_chunks": chunks.len(),
            "created_time": chrono::Utc::now().to_rfc3339(),
            "source_file": source_file,
            "split_marker": marker,
        },
        "chunks": chunks,
    });

    let content = serde_json::to_string_pretty(&envelope)
        .map_err(|e| SplitError::FileReadError(e.to_string()))?;
    std::fs::write(output, content)
        .map_err(|e| SplitError::FileReadError(format!("{}: {}", output.display(), e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
# Top\nintro text\n### A\nalpha body\nmore alpha\n### B\nbeta body\n### C\ngamma body\n";

    #[test]
    fn test_three_heading_document() {
        let splitter = MarkdownSplitter::with_marker("###");
        let chunks = splitter.split(DOC).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].title, "A");
        assert_eq!(chunks[1].title, "B");
        assert_eq!(chunks[2].title, "C");
        for chunk in &chunks {
            assert!(chunk.content.starts_with(&format!("### {}", chunk.title)));
            assert_eq!(chunk.level, 3);
        }
    }

    #[test]
    fn test_preamble_is_discarded() {
        let splitter = MarkdownSplitter::with_marker("###");
        let chunks = splitter.split(DOC).unwrap();
        let joined: String = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(!joined.contains("intro text"));
        assert!(!joined.contains("# Top"));
    }

    #[test]
    fn test_reconstruction_minus_preamble() {
        let splitter = MarkdownSplitter::with_marker("###");
        let chunks = splitter.split(DOC).unwrap();
        let joined = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        // The document from the first heading on, modulo trailing trim.
        let expected = DOC[DOC.find("### A").unwrap()..].trim_end();
        assert_eq!(joined, expected);
    }

    #[test]
    fn test_line_numbers() {
        let splitter = MarkdownSplitter::with_marker("###");
        let chunks = splitter.split(DOC).unwrap();
        // "### A" is line 3 of the document.
        assert_eq!(chunks[0].start_line, 3);
        assert_eq!(chunks[0].end_line, 5);
        assert_eq!(chunks[1].start_line, 6);
        assert_eq!(chunks[1].end_line, 7);
        assert_eq!(chunks[2].start_line, 8);
        // Final chunk runs to end-of-document (trailing newline adds a line).
        assert_eq!(chunks[2].end_line, DOC.split('\n').count());
    }

    #[test]
    fn test_no_marker_yields_empty() {
        let splitter = MarkdownSplitter::with_marker("###");
        let chunks = splitter.split("just some text\nwith no headings\n").unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_empty_document() {
        let splitter = MarkdownSplitter::with_marker("###");
        assert!(splitter.split("").unwrap().is_empty());
    }

    #[test]
    fn test_marker_must_be_followed_by_space() {
        let splitter = MarkdownSplitter::with_marker("###");
        // "####" headings and bare "###" lines do not split.
        let chunks = splitter.split("#### deeper\ntext\n###\nmore\n").unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_duplicate_titles_produce_two_chunks() {
        let splitter = MarkdownSplitter::with_marker("###");
        let chunks = splitter.split("### Same\none\n### Same\ntwo\n").unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].title, chunks[1].title);
        assert_ne!(chunks[0].content, chunks[1].content);
    }

    #[test]
    fn test_empty_marker_rejected() {
        let splitter = MarkdownSplitter::with_marker("");
        assert!(splitter.split(DOC).is_err());
    }

    #[test]
    fn test_count_semantics_multibyte() {
        let splitter = MarkdownSplitter::with_marker("###");
        let chunks = splitter.split("### 群组\n直播群特点\n").unwrap();
        assert_eq!(chunks.len(), 1);
        let c = &chunks[0];
        assert_eq!(c.char_count, c.content.len());
        assert_eq!(c.word_count, c.content.chars().count());
    }

    #[test]
    fn test_analyze_chunks() {
        let splitter = MarkdownSplitter::with_marker("###");
        let chunks = splitter.split(DOC).unwrap();
        let stats = analyze_chunks(&chunks);
        assert_eq!(stats.total_chunks, 3);
        assert!(stats.min_chunk_size <= stats.avg_chunk_size);
        assert!(stats.avg_chunk_size <= stats.max_chunk_size);
        assert_eq!(
            stats.total_characters,
            chunks.iter().map(|c| c.char_count).sum::<usize>()
        );
    }

    #[test]
    fn test_keyword_search_and_title_lookup() {
        let splitter = MarkdownSplitter::with_marker("###");
        let chunks = splitter.split(DOC).unwrap();

        let hits = search_by_keyword(&chunks, "ALPHA");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "A");

        assert!(find_by_title(&chunks, "B").is_some());
        assert!(find_by_title(&chunks, "missing").is_none());
    }

    #[test]
    fn test_filter_by_size() {
        let splitter = MarkdownSplitter::with_marker("###");
        let chunks = splitter.split(DOC).unwrap();
        let all = filter_by_size(&chunks, 0, usize::MAX);
        assert_eq!(all.len(), chunks.len());
        let none = filter_by_size(&chunks, usize::MAX, usize::MAX);
        assert!(none.is_empty());
    }
}
