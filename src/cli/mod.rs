//! CLI module for the Markdown RAG tool.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Retrieval-augmented question answering over Markdown documents.
#[derive(Debug, Parser)]
#[command(name = "mdrag")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Split a Markdown document into heading-delimited chunks
    Split(commands::SplitArgs),

    /// Split, embed and store a document in the vector store
    Ingest(commands::IngestArgs),

    /// Search the vector store for chunks similar to a query
    Search(commands::SearchArgs),

    /// Answer a question from retrieved document context
    Ask(commands::AskArgs),

    /// Show vector store status
    Status,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}
