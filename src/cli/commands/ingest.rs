use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{EmbeddingClient, Ingestor};

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[arg(required = true, help = "Markdown file to ingest")]
    pub file: PathBuf,

    #[arg(long, short = 'm', help = "Heading marker that starts a chunk")]
    pub marker: Option<String>,

    #[arg(long, help = "Store name (directory under the data dir)")]
    pub store: Option<String>,
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(marker) = args.marker {
        config.split.marker = marker;
    }
    if let Some(store) = args.store {
        config.store.name = store;
    }

    let formatter = get_formatter(format);

    if !args.file.exists() {
        print!(
            "{}",
            formatter.format_error(&format!("file not found: {}", args.file.display()))
        );
        return Ok(());
    }

    let store_dir = config.store.store_dir()?;
    if verbose {
        eprintln!("Source: {}", args.file.display());
        eprintln!("Store: {}", store_dir.display());
        eprintln!(
            "Embedding: {} ({} dims, batches of {})",
            config.embedding.model, config.embedding.dimension, config.embedding.batch_size
        );
    }

    let embedder = EmbeddingClient::new(&config.embedding)?;
    let ingestor = Ingestor::new(&config, embedder);

    // Progress bars only make sense on a terminal in text mode.
    let show_progress = format == OutputFormat::Text;
    let stats = ingestor
        .ingest(&args.file, &store_dir, show_progress)
        .await
        .context("ingestion failed")?;

    print!("{}", formatter.format_ingest_stats(&stats));

    Ok(())
}
