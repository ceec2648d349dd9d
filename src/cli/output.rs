use std::fmt::Write as FmtWrite;

use crate::models::{AskReport, Chunk, OutputFormat, ScoredChunk};
use crate::services::{ChunkStats, IngestStats, StoreInfo};

pub trait Formatter {
    fn format_chunks(&self, chunks: &[Chunk], stats: &ChunkStats) -> String;
    fn format_ingest_stats(&self, stats: &IngestStats) -> String;
    fn format_search_results(&self, results: &SearchResults) -> String;
    fn format_ask_report(&self, report: &AskReport) -> String;
    fn format_store_info(&self, info: &StoreInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

/// Search hits plus the query and timing that produced them.
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<ScoredChunk>,
    pub duration_ms: u64,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

fn preview(content: &str, max_chars: usize) -> String {
    let head: String = content.chars().take(max_chars).collect();
    if content.chars().count() > max_chars {
        format!("{}...", head)
    } else {
        head
    }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_chunks(&self, chunks: &[Chunk], stats: &ChunkStats) -> String {
        if chunks.is_empty() {
            return "No chunks produced.\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "Split into {} chunks", stats.total_chunks).unwrap();
        writeln!(
            output,
            "Size: avg {} / min {} / max {} bytes\n",
            stats.avg_chunk_size, stats.min_chunk_size, stats.max_chunk_size
        )
        .unwrap();

        for (i, chunk) in chunks.iter().enumerate() {
            writeln!(
                output,
                "{}. {} (lines {}-{}, {} bytes)",
                i + 1,
                chunk.title,
                chunk.start_line,
                chunk.end_line,
                chunk.char_count
            )
            .unwrap();
        }

        output
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let mut output = String::new();
        writeln!(output, "Ingestion Complete").unwrap();
        writeln!(output, "------------------").unwrap();
        writeln!(output, "Source: {}", stats.source_file).unwrap();
        writeln!(output, "Store: {}", stats.store_path.display()).unwrap();
        writeln!(output, "Chunks: {}", stats.total_chunks).unwrap();
        writeln!(output, "Batches: {}", stats.batches).unwrap();
        writeln!(output, "Dimension: {}", stats.dimension).unwrap();
        writeln!(output, "Duration: {}ms", stats.elapsed_ms).unwrap();
        output
    }

    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("No results found for: {}\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "Search results for: \"{}\"", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in {}ms\n",
            results.hits.len(),
            results.duration_ms
        )
        .unwrap();

        for (i, hit) in results.hits.iter().enumerate() {
            writeln!(
                output,
                "{}. [Similarity: {:.3}] {}",
                i + 1,
                hit.similarity_score,
                hit.chunk.title
            )
            .unwrap();
            writeln!(
                output,
                "   Lines {}-{} ({})",
                hit.chunk.start_line, hit.chunk.end_line, hit.id
            )
            .unwrap();
            writeln!(output, "   ---").unwrap();
            for line in preview(&hit.chunk.content, 200).lines() {
                writeln!(output, "   {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_ask_report(&self, report: &AskReport) -> String {
        let mut output = String::new();
        writeln!(output, "Question: {}", report.query).unwrap();
        writeln!(output, "Strategy: {}\n", report.strategy).unwrap();

        match (&report.answer, &report.error) {
            (Some(answer), _) => {
                writeln!(output, "{}", answer).unwrap();
            }
            (None, Some(error)) => {
                writeln!(output, "Generation failed: {}", error).unwrap();
            }
            (None, None) => {
                writeln!(output, "No answer produced.").unwrap();
            }
        }

        writeln!(output).unwrap();
        writeln!(
            output,
            "Retrieved {} sections, {} context bytes",
            report.retrieved_documents.len(),
            report.context_chars
        )
        .unwrap();
        if let Some(ref llm) = report.llm {
            writeln!(
                output,
                "Tokens: {} prompt + {} completion = {}",
                llm.prompt_tokens, llm.completion_tokens, llm.total_tokens
            )
            .unwrap();
        }
        writeln!(
            output,
            "Timing: retrieval {}ms, total {}ms",
            report.retrieval_ms, report.total_ms
        )
        .unwrap();

        output
    }

    fn format_store_info(&self, info: &StoreInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Store Status").unwrap();
        writeln!(output, "------------").unwrap();
        writeln!(output, "Path: {}", info.path.display()).unwrap();
        writeln!(output, "Chunks: {}", info.total_chunks).unwrap();
        writeln!(output, "Size: {:.2} MB", info.size_mb).unwrap();
        writeln!(output, "Source: {}", info.manifest.source_file).unwrap();
        writeln!(output, "Checksum: {}", info.manifest.source_checksum).unwrap();
        writeln!(output, "Marker: {}", info.manifest.split_marker).unwrap();
        writeln!(
            output,
            "Model: {} ({} dims)",
            info.manifest.embedding_model, info.manifest.dimension
        )
        .unwrap();
        writeln!(output, "Created: {}", info.manifest.created_at).unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, value: &serde_json::Value) -> String {
        if self.pretty {
            serde_json::to_string_pretty(value)
                .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
        } else {
            serde_json::to_string(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
        }
    }
}

impl Formatter for JsonFormatter {
    fn format_chunks(&self, chunks: &[Chunk], stats: &ChunkStats) -> String {
        self.render(&serde_json::json!({
            "stats": stats,
            "chunks": chunks,
        }))
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        self.render(&serde_json::json!(stats))
    }

    fn format_search_results(&self, results: &SearchResults) -> String {
        self.render(&serde_json::json!({
            "query": results.query,
            "total": results.hits.len(),
            "duration_ms": results.duration_ms,
            "results": results.hits,
        }))
    }

    fn format_ask_report(&self, report: &AskReport) -> String {
        self.render(&serde_json::json!(report))
    }

    fn format_store_info(&self, info: &StoreInfo) -> String {
        self.render(&serde_json::json!(info))
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_chunks(&self, chunks: &[Chunk], stats: &ChunkStats) -> String {
        if chunks.is_empty() {
            return "## Split\n\n*No chunks produced.*\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "## Split Results\n").unwrap();
        writeln!(output, "**Chunks:** {}\n", stats.total_chunks).unwrap();
        writeln!(output, "| # | Title | Lines | Bytes | Chars |").unwrap();
        writeln!(output, "|---|-------|-------|-------|-------|").unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            writeln!(
                output,
                "| {} | {} | {}-{} | {} | {} |",
                i + 1,
                chunk.title,
                chunk.start_line,
                chunk.end_line,
                chunk.char_count,
                chunk.word_count
            )
            .unwrap();
        }
        output
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let mut output = String::new();
        writeln!(output, "## Ingestion Complete\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Source | `{}` |", stats.source_file).unwrap();
        writeln!(output, "| Store | `{}` |", stats.store_path.display()).unwrap();
        writeln!(output, "| Chunks | {} |", stats.total_chunks).unwrap();
        writeln!(output, "| Batches | {} |", stats.batches).unwrap();
        writeln!(output, "| Dimension | {} |", stats.dimension).unwrap();
        writeln!(output, "| Duration | {}ms |", stats.elapsed_ms).unwrap();
        output
    }

    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("## No results found\n\nQuery: `{}`\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "## Search Results\n").unwrap();
        writeln!(output, "**Query:** `{}`\n", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in {}ms\n",
            results.hits.len(),
            results.duration_ms
        )
        .unwrap();

        for (i, hit) in results.hits.iter().enumerate() {
            writeln!(
                output,
                "### {}. {} (similarity {:.3})\n",
                i + 1,
                hit.chunk.title,
                hit.similarity_score
            )
            .unwrap();
            writeln!(
                output,
                "**Lines:** {}-{} | **Id:** `{}`\n",
                hit.chunk.start_line, hit.chunk.end_line, hit.id
            )
            .unwrap();
            writeln!(output, "```").unwrap();
            writeln!(output, "{}", hit.chunk.content).unwrap();
            writeln!(output, "```\n").unwrap();
        }

        output
    }

    fn format_ask_report(&self, report: &AskReport) -> String {
        let mut output = String::new();
        writeln!(output, "## {}\n", report.query).unwrap();

        match (&report.answer, &report.error) {
            (Some(answer), _) => writeln!(output, "{}\n", answer).unwrap(),
            (None, Some(error)) => {
                writeln!(output, "> **Generation failed:** {}\n", error).unwrap()
            }
            (None, None) => writeln!(output, "*No answer produced.*\n").unwrap(),
        }

        writeln!(output, "---\n").unwrap();
        writeln!(output, "- **Strategy:** {}", report.strategy).unwrap();
        writeln!(
            output,
            "- **Retrieved:** {} sections ({} context bytes)",
            report.retrieved_documents.len(),
            report.context_chars
        )
        .unwrap();
        if let Some(ref llm) = report.llm {
            writeln!(output, "- **Model:** {}", llm.model).unwrap();
            writeln!(output, "- **Tokens:** {}", llm.total_tokens).unwrap();
        }
        writeln!(
            output,
            "- **Timing:** retrieval {}ms, total {}ms",
            report.retrieval_ms, report.total_ms
        )
        .unwrap();

        output
    }

    fn format_store_info(&self, info: &StoreInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Store Status\n").unwrap();
        writeln!(output, "| Field | Value |").unwrap();
        writeln!(output, "|-------|-------|").unwrap();
        writeln!(output, "| Path | `{}` |", info.path.display()).unwrap();
        writeln!(output, "| Chunks | {} |", info.total_chunks).unwrap();
        writeln!(output, "| Size | {:.2} MB |", info.size_mb).unwrap();
        writeln!(output, "| Source | `{}` |", info.manifest.source_file).unwrap();
        writeln!(output, "| Marker | `{}` |", info.manifest.split_marker).unwrap();
        writeln!(
            output,
            "| Model | {} ({} dims) |",
            info.manifest.embedding_model, info.manifest.dimension
        )
        .unwrap();
        writeln!(output, "| Created | {} |", info.manifest.created_at).unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analyze_chunks;

    fn sample_hit() -> ScoredChunk {
        ScoredChunk {
            id: "chunk_000".into(),
            chunk: Chunk::new("Intro".into(), "### Intro\nbody".into(), 3, 1, 2),
            similarity_score: 0.91,
            distance_score: 0.09,
        }
    }

    #[test]
    fn test_text_search_results() {
        let results = SearchResults {
            query: "q".into(),
            hits: vec![sample_hit()],
            duration_ms: 12,
        };
        let out = TextFormatter.format_search_results(&results);
        assert!(out.contains("Found 1 results in 12ms"));
        assert!(out.contains("Intro"));
        assert!(out.contains("0.910"));
    }

    #[test]
    fn test_text_empty_results() {
        let results = SearchResults {
            query: "nothing".into(),
            hits: vec![],
            duration_ms: 3,
        };
        let out = TextFormatter.format_search_results(&results);
        assert!(out.contains("No results found for: nothing"));
    }

    #[test]
    fn test_json_search_results_parse_back() {
        let results = SearchResults {
            query: "q".into(),
            hits: vec![sample_hit()],
            duration_ms: 12,
        };
        let out = JsonFormatter::new(false).format_search_results(&results);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["results"][0]["chunk"]["title"], "Intro");
    }

    #[test]
    fn test_markdown_chunks_table() {
        let chunks = vec![Chunk::new("A".into(), "### A\nbody".into(), 3, 1, 2)];
        let stats = analyze_chunks(&chunks);
        let out = MarkdownFormatter.format_chunks(&chunks, &stats);
        assert!(out.contains("| 1 | A |"));
    }

    #[test]
    fn test_ask_report_error_rendering() {
        let report = AskReport::failed("q", "remote".into(), "backend down");
        let out = TextFormatter.format_ask_report(&report);
        assert!(out.contains("Generation failed: backend down"));
    }
}
