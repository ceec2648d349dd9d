use anyhow::Result;
use clap::Args;
use std::time::Instant;

use crate::cli::output::{SearchResults, get_formatter};
use crate::error::StoreError;
use crate::models::{Config, OutputFormat};
use crate::services::{EmbeddingClient, Retriever, VectorStore};

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true, help = "Search query text")]
    pub query: String,

    #[arg(long, short = 'k', help = "Maximum number of results to return")]
    pub top_k: Option<usize>,

    #[arg(long, help = "Store name (directory under the data dir)")]
    pub store: Option<String>,
}

pub async fn handle_search(args: SearchArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("search query cannot be empty");
    }

    let mut config = Config::load()?;
    if let Some(store) = args.store {
        config.store.name = store;
    }
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let k = args.top_k.unwrap_or(config.retrieval.default_k);
    if k == 0 {
        anyhow::bail!("top_k must be at least 1");
    }

    let store_dir = config.store.store_dir()?;
    let store = match VectorStore::open(&store_dir) {
        Ok(store) => store,
        Err(StoreError::NotFound(_)) => {
            print!(
                "{}",
                formatter.format_error(&format!(
                    "no store at {}; run `mdrag ingest` first",
                    store_dir.display()
                ))
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  Store: {} ({} chunks)", store_dir.display(), store.count()?);
        eprintln!("  Top-k: {k}");
    }

    let embedder = EmbeddingClient::new(&config.embedding)?;
    let retriever = Retriever::new(&embedder, &store);
    let outcome = retriever.retrieve(query, k).await?;

    if verbose {
        eprintln!("Timing:");
        eprintln!("  Retrieval: {}ms", outcome.retrieval_ms);
        eprintln!("  Total: {}ms", start_time.elapsed().as_millis());
        eprintln!();
    }

    let results = SearchResults {
        query: query.to_string(),
        hits: outcome.hits,
        duration_ms: start_time.elapsed().as_millis() as u64,
    };

    print!("{}", formatter.format_search_results(&results));

    Ok(())
}
