use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::get_formatter;
use crate::models::{Chunk, Config, OutputFormat};
use crate::services::{
    MarkdownSplitter, analyze_chunks, filter_by_size, find_by_title, save_chunks_to_json,
    search_by_keyword,
};

#[derive(Debug, Args)]
pub struct SplitArgs {
    #[arg(required = true, help = "Markdown file to split")]
    pub file: PathBuf,

    #[arg(long, short = 'm', help = "Heading marker that starts a chunk")]
    pub marker: Option<String>,

    #[arg(long, help = "Keep only chunks whose title or content contains this keyword")]
    pub keyword: Option<String>,

    #[arg(long, help = "Keep only the first chunk with this exact title")]
    pub title: Option<String>,

    #[arg(long, help = "Keep only chunks of at least this many bytes")]
    pub min_size: Option<usize>,

    #[arg(long, help = "Keep only chunks of at most this many bytes")]
    pub max_size: Option<usize>,

    #[arg(long, short = 'o', help = "Write chunks to a JSON file")]
    pub output: Option<PathBuf>,
}

pub async fn handle_split(args: SplitArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let marker = args.marker.clone().unwrap_or(config.split.marker);
    let splitter = MarkdownSplitter::with_marker(marker.as_str());

    if !args.file.exists() {
        print!(
            "{}",
            formatter.format_error(&format!("file not found: {}", args.file.display()))
        );
        return Ok(());
    }

    if verbose {
        eprintln!("Splitting {} on \"{} \"", args.file.display(), marker);
    }

    let chunks = splitter.split_file(&args.file)?;
    let selected = select_chunks(
        &chunks,
        args.title.as_deref(),
        args.keyword.as_deref(),
        args.min_size,
        args.max_size,
    );
    let stats = analyze_chunks(&selected);

    if verbose && selected.len() != chunks.len() {
        eprintln!("Selected {} of {} chunks", selected.len(), chunks.len());
    }

    print!("{}", formatter.format_chunks(&selected, &stats));

    if let Some(ref output) = args.output {
        save_chunks_to_json(
            &selected,
            output,
            &args.file.display().to_string(),
            &marker,
        )?;
        print!(
            "{}",
            formatter
                .format_message(&format!("Wrote {} chunks to {}", selected.len(), output.display()))
        );
    }

    Ok(())
}

/// Narrow the chunk list by title, keyword and size bounds, in that order.
fn select_chunks(
    chunks: &[Chunk],
    title: Option<&str>,
    keyword: Option<&str>,
    min_size: Option<usize>,
    max_size: Option<usize>,
) -> Vec<Chunk> {
    let mut selected: Vec<Chunk> = match title {
        Some(title) => find_by_title(chunks, title).cloned().into_iter().collect(),
        None => chunks.to_vec(),
    };

    if let Some(keyword) = keyword {
        selected = search_by_keyword(&selected, keyword)
            .into_iter()
            .cloned()
            .collect();
    }

    if min_size.is_some() || max_size.is_some() {
        selected = filter_by_size(
            &selected,
            min_size.unwrap_or(0),
            max_size.unwrap_or(usize::MAX),
        )
        .into_iter()
        .cloned()
        .collect();
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chunks() -> Vec<Chunk> {
        MarkdownSplitter::with_marker("###")
            .split("### Alpha\nshort\n### Beta\nalpha is mentioned here too\n### Gamma\nlong body with several more words in it\n")
            .unwrap()
    }

    #[test]
    fn test_select_by_title() {
        let chunks = sample_chunks();
        let selected = select_chunks(&chunks, Some("Beta"), None, None, None);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].title, "Beta");

        let missing = select_chunks(&chunks, Some("Delta"), None, None, None);
        assert!(missing.is_empty());
    }

    #[test]
    fn test_select_by_keyword() {
        let chunks = sample_chunks();
        // Matches the "Alpha" title and the "Beta" body, not "Gamma".
        let selected = select_chunks(&chunks, None, Some("ALPHA"), None, None);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].title, "Alpha");
        assert_eq!(selected[1].title, "Beta");
    }

    #[test]
    fn test_select_by_size_bounds() {
        let chunks = sample_chunks();
        let smallest = chunks.iter().map(|c| c.char_count).min().unwrap();

        let selected = select_chunks(&chunks, None, None, Some(smallest + 1), None);
        assert_eq!(selected.len(), chunks.len() - 1);

        let only_small = select_chunks(&chunks, None, None, None, Some(smallest));
        assert_eq!(only_small.len(), 1);
    }

    #[test]
    fn test_select_filters_compose() {
        let chunks = sample_chunks();
        // Title narrows to one chunk, then the keyword must still match it.
        let selected = select_chunks(&chunks, Some("Beta"), Some("gamma"), None, None);
        assert!(selected.is_empty());

        let no_filters = select_chunks(&chunks, None, None, None, None);
        assert_eq!(no_filters.len(), chunks.len());
    }
}
