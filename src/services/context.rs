//! Token-budgeted context assembly for answer generation.

use crate::models::ScoredChunk;

/// Estimated tokens per character of context text.
pub const TOKENS_PER_CHAR: f64 = 1.5;

/// Smallest remaining budget worth filling with a truncated section.
pub const MIN_TAIL_TOKENS: usize = 200;

/// The assembled context plus accounting for run reports.
#[derive(Debug, Clone)]
pub struct BuiltContext {
    pub text: String,
    pub used_chunks: usize,
    pub estimated_tokens: usize,
    pub truncated: bool,
}

fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() as f64 * TOKENS_PER_CHAR) as usize
}

fn render_section(chunk: &ScoredChunk) -> String {
    format!("## {}\n\n{}\n\n", chunk.chunk.title, chunk.chunk.content)
}

/// Pack retrieved chunks into a context string, greedily in retrieval order.
///
/// Sections are added whole while they fit the token budget. The first
/// section that does not fit is truncated to the remaining budget and
/// suffixed with `...\n\n`, but only when at least [`MIN_TAIL_TOKENS`]
/// remain; otherwise it and everything after it are dropped.
pub fn build_context(chunks: &[ScoredChunk], max_tokens: usize) -> BuiltContext {
    let mut text = String::new();
    let mut used_tokens = 0usize;
    let mut used_chunks = 0usize;
    let mut truncated = false;

    for chunk in chunks {
        let section = render_section(chunk);
        let section_tokens = estimate_tokens(&section);

        if used_tokens + section_tokens <= max_tokens {
            text.push_str(&section);
            used_tokens += section_tokens;
            used_chunks += 1;
            continue;
        }

        let remaining = max_tokens.saturating_sub(used_tokens);
        if remaining >= MIN_TAIL_TOKENS {
            let keep_chars = (remaining as f64 / TOKENS_PER_CHAR) as usize;
            let head: String = section.chars().take(keep_chars).collect();
            text.push_str(&head);
            // Truncated sections keep the section separator.
            text.push_str("...\n\n");
            used_chunks += 1;
            truncated = true;
        }
        break;
    }

    BuiltContext {
        estimated_tokens: estimate_tokens(&text),
        text,
        used_chunks,
        truncated,
    }
}
