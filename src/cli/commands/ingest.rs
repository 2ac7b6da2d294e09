//! Ingest command implementation.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::output::get_formatter;
use crate::loader::DocumentLoader;
use crate::models::{Config, OutputFormat};
use crate::services::{
    Indexer, OllamaEmbedding, TextChunker, VectorIndex, assign_identities, create_backend,
};

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Content directory to ingest (defaults to the configured data dir)
    pub path: Option<PathBuf>,

    /// Delete the persisted index before ingesting
    #[arg(long)]
    pub reset: bool,

    /// Show what would be added without embedding or writing anything
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let dir = args
        .path
        .unwrap_or_else(|| config.indexing.data_dir.clone());

    let index = create_backend(&config.vector_store, config.embedding.dimension)
        .context("failed to create vector index client")?;

    if args.dry_run {
        let outcome = DocumentLoader::new(&config.indexing).load_dir(&dir)?;
        let mut chunks = TextChunker::new(&config.indexing).split(&outcome.documents);
        assign_identities(&mut chunks);

        let existing = index.existing_ids().await?;
        let new_count = chunks
            .iter()
            .filter(|chunk| !existing.contains(&chunk.stable_id))
            .count();

        println!(
            "{}",
            formatter.format_message(&format!(
                "Dry run: {} documents, {} chunks, {} would be added",
                outcome.documents.len(),
                chunks.len(),
                new_count
            ))
        );
        if verbose {
            for chunk in chunks.iter().filter(|c| !existing.contains(&c.stable_id)) {
                println!("  {}", chunk.stable_id);
            }
        }
        return Ok(());
    }

    let embedder = Arc::new(
        OllamaEmbedding::new(&config.embedding).context("failed to create embedding client")?,
    );
    let indexer = Indexer::new(&config, embedder, index);

    if args.reset {
        indexer.reset().await.context("failed to reset index")?;
        println!("{}", formatter.format_message("Index cleared."));
    }

    if verbose {
        println!("Ingesting from {}", dir.display());
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap()
            .progress_chars("#>-"),
    );

    let report = indexer
        .ingest_with_progress(&dir, |done, total| {
            if pb.length() != Some(total) {
                pb.set_length(total);
            }
            pb.set_position(done);
        })
        .await
        .context("ingest failed")?;

    pb.finish_and_clear();
    print!("{}", formatter.format_ingest_report(&report));

    Ok(())
}
