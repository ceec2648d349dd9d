use anyhow::Result;

use crate::cli::output::get_formatter;
use crate::error::StoreError;
use crate::models::{Config, OutputFormat};
use crate::services::VectorStore;

pub async fn handle_status(format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let store_dir = config.store.store_dir()?;
    if verbose {
        eprintln!("Store dir: {}", store_dir.display());
    }

    match VectorStore::open(&store_dir) {
        Ok(store) => {
            let info = store.info()?;
            print!("{}", formatter.format_store_info(&info));
        }
        Err(StoreError::NotFound(_)) => {
            print!(
                "{}",
                formatter.format_message(&format!(
                    "No store at {}; run `mdrag ingest` to create one",
                    store_dir.display()
                ))
            );
        }
        Err(e) => return Err(e.into()),
    }

    let key_state = |present: bool| if present { "key set" } else { "key missing" };
    print!(
        "{}",
        formatter.format_message(&format!(
            "Embedding backend: {} / {} ({})",
            config.embedding.url,
            config.embedding.model,
            key_state(config.embedding.api_key().is_some())
        ))
    );
    print!(
        "{}",
        formatter.format_message(&format!(
            "Chat backend: {} / {} ({}, strategy: {})",
            config.chat.url,
            config.chat.model,
            key_state(config.chat.api_key().is_some()),
            config.generation.strategy
        ))
    );

    Ok(())
}
