//! CLI module for the RAG pipeline.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Retrieval-augmented generation over a local document collection.
#[derive(Debug, Parser)]
#[command(name = "ragdex")]
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
    /// Check infrastructure status (model backend, vector index)
    Status,

    /// Ingest documents from the content directory into the index
    Ingest(commands::IngestArgs),

    /// Ask a question against the indexed documents
    Query(commands::QueryArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}
