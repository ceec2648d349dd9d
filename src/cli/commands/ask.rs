use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

use crate::cli::output::get_formatter;
use crate::models::{AskReport, BatchReport, Config, OutputFormat, RetrievedDoc};
use crate::services::{
    AnswerStrategy, EmbeddingClient, Retriever, SessionStore, VectorStore, build_context,
};
use crate::error::StoreError;

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(
        required_unless_present = "batch",
        conflicts_with = "batch",
        help = "Question to answer"
    )]
    pub query: Option<String>,

    #[arg(long, help = "File with one question per line")]
    pub batch: Option<PathBuf>,

    #[arg(long, short = 'k', help = "Number of chunks to retrieve")]
    pub top_k: Option<usize>,

    #[arg(long, help = "Store name (directory under the data dir)")]
    pub store: Option<String>,

    #[arg(long, short = 'o', help = "Write the run report to a JSON file")]
    pub output: Option<PathBuf>,
}

pub async fn handle_ask(args: AskArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(ref store) = args.store {
        config.store.name = store.clone();
    }
    let formatter = get_formatter(format);

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

    let embedder = EmbeddingClient::new(&config.embedding)?;
    let strategy = AnswerStrategy::from_config(&config)?;
    let retriever = Retriever::new(&embedder, &store);
    let k = args.top_k.unwrap_or(config.retrieval.default_k);
    let max_tokens = config.retrieval.max_context_tokens;

    if verbose {
        eprintln!("Store: {} ({} chunks)", store_dir.display(), store.count()?);
        eprintln!("Strategy: {}", strategy.kind());
        eprintln!("Top-k: {k}, context budget: {max_tokens} tokens");
    }

    let mut session = SessionStore::new();

    if let Some(ref batch_file) = args.batch {
        let queries = read_batch_file(batch_file)?;
        if queries.is_empty() {
            anyhow::bail!("batch file contains no queries: {}", batch_file.display());
        }

        let batch_start = Instant::now();
        let mut results = Vec::with_capacity(queries.len());
        let pause = std::time::Duration::from_secs(config.generation.query_pause_secs);

        for (i, query) in queries.iter().enumerate() {
            if verbose {
                eprintln!("[{}/{}] {}", i + 1, queries.len(), query);
            }

            let report = run_query(&retriever, &strategy, query, k, max_tokens).await;
            session.record(query.clone(), report.answer.clone());
            print!("{}", formatter.format_ask_report(&report));
            results.push(report);

            if i + 1 < queries.len() && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        let batch_report = BatchReport::new(results, batch_start.elapsed().as_millis() as u64);

        if verbose {
            eprintln!(
                "Batch done: {}/{} answered in {}ms",
                batch_report.summary.successful_queries,
                batch_report.summary.total_queries,
                batch_report.summary.total_ms
            );
        }

        if let Some(ref output) = args.output {
            write_report_json(output, &batch_report)?;
            print!(
                "{}",
                formatter.format_message(&format!("Wrote batch report to {}", output.display()))
            );
        }
    } else if let Some(ref query) = args.query {
        let report = run_query(&retriever, &strategy, query, k, max_tokens).await;
        session.record(query.clone(), report.answer.clone());
        print!("{}", formatter.format_ask_report(&report));

        if let Some(ref output) = args.output {
            write_report_json(output, &report)?;
            print!(
                "{}",
                formatter.format_message(&format!("Wrote report to {}", output.display()))
            );
        }
    }

    if verbose {
        let answered = session
            .exchanges()
            .iter()
            .filter(|e| e.answer.is_some())
            .count();
        eprintln!("Session: {} exchanges, {} answered", session.len(), answered);
    }

    Ok(())
}

/// One retrieve-and-generate run. Failures land in the report's `error`
/// field so a batch keeps going past a flaky backend call.
async fn run_query(
    retriever: &Retriever<'_>,
    strategy: &AnswerStrategy,
    query: &str,
    k: usize,
    max_tokens: usize,
) -> AskReport {
    let started = Instant::now();
    let strategy_name = strategy.kind().to_string();

    let retrieval = match retriever.retrieve(query, k).await {
        Ok(outcome) => outcome,
        Err(e) => return AskReport::failed(query, strategy_name, e.to_string()),
    };

    let context = build_context(&retrieval.hits, max_tokens);
    let retrieved_documents: Vec<RetrievedDoc> = retrieval
        .hits
        .iter()
        .map(|hit| RetrievedDoc::new(&hit.chunk.title, hit.similarity_score, &hit.chunk.content))
        .collect();

    match strategy.answer(query, &context.text).await {
        Ok(outcome) => AskReport {
            query: query.to_string(),
            answer: Some(outcome.answer),
            error: None,
            strategy: strategy_name,
            llm: outcome.llm,
            retrieved_documents,
            context_chars: context.text.len(),
            retrieval_ms: retrieval.retrieval_ms,
            total_ms: started.elapsed().as_millis() as u64,
            timestamp: chrono::Utc::now().to_rfc3339(),
        },
        Err(e) => AskReport {
            query: query.to_string(),
            answer: None,
            error: Some(e.to_string()),
            strategy: strategy_name,
            llm: None,
            retrieved_documents,
            context_chars: context.text.len(),
            retrieval_ms: retrieval.retrieval_ms,
            total_ms: started.elapsed().as_millis() as u64,
            timestamp: chrono::Utc::now().to_rfc3339(),
        },
    }
}

/// One query per line; blank lines and `#` comments are skipped.
fn read_batch_file(path: &PathBuf) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .context(format!("failed to read batch file: {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect())
}

fn write_report_json<T: serde::Serialize>(path: &PathBuf, report: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).context(format!("failed to write report: {}", path.display()))?;
    Ok(())
}
