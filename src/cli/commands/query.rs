//! Query command implementation.
//!
//! Text output streams answer tokens to stdout as the model produces them;
//! JSON output collects the whole stream first.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::models::{Config, OutputFormat};
use crate::services::{
    AnswerFragment, AnswerGenerator, AnswerStream, OllamaEmbedding, Retriever, create_backend,
};

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[arg(required = true, help = "Question to answer from the indexed documents")]
    pub query: String,

    #[arg(long, short = 'k', help = "How many chunks to retrieve")]
    pub k: Option<u32>,

    #[arg(long, short = 'm', help = "Generation model name")]
    pub model: Option<String>,

    #[arg(long, help = "Minimum similarity score threshold (0.0-1.0)")]
    pub min_score: Option<f32>,
}

pub async fn handle_query(args: QueryArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("query cannot be empty");
    }

    let config = Config::load()?;

    let k = args.k.unwrap_or(config.search.default_k);
    if k == 0 {
        anyhow::bail!("k must be at least 1");
    }

    let min_score = args.min_score.or(config.search.default_min_score);
    if let Some(score) = min_score
        && !(0.0..=1.0).contains(&score)
    {
        anyhow::bail!("min_score must be between 0.0 and 1.0");
    }

    let embedder = Arc::new(
        OllamaEmbedding::new(&config.embedding).context("failed to create embedding client")?,
    );
    let index = create_backend(&config.vector_store, config.embedding.dimension)
        .context("failed to create vector index client")?;

    let retriever =
        Arc::new(Retriever::new(&config, embedder, index).with_min_score(min_score));
    let generator = AnswerGenerator::new(&config, retriever)
        .context("failed to create answer generator")?;

    if verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  k: {k}");
        eprintln!(
            "  Model: {}",
            args.model.as_deref().unwrap_or(&config.generation.model)
        );
        if let Some(score) = min_score {
            eprintln!("  Min score: {score:.3}");
        }
    }

    let stream = generator
        .generate(query, k, args.model.as_deref())
        .await
        .context("retrieval failed")?;

    match format {
        OutputFormat::Json => render_json(stream).await,
        _ => render_streaming(stream).await,
    }
}

/// Print fragments as they arrive.
async fn render_streaming(mut stream: AnswerStream) -> Result<()> {
    let mut wrote_tokens = false;

    while let Some(fragment) = stream.recv().await {
        match fragment {
            AnswerFragment::Token(token) => {
                print!("{token}");
                std::io::stdout().flush().ok();
                wrote_tokens = true;
            }
            AnswerFragment::Notice(notice) => {
                println!("{notice}");
            }
            AnswerFragment::Citations(sources) => {
                println!("\n\nSources:");
                for source in sources {
                    println!("  - {source}");
                }
            }
            AnswerFragment::Error(message) => {
                if wrote_tokens {
                    println!();
                }
                anyhow::bail!("{message}");
            }
        }
    }

    Ok(())
}

/// Collect the full stream, then emit one JSON document.
async fn render_json(stream: AnswerStream) -> Result<()> {
    let mut answer = String::new();
    let mut notice = None;
    let mut sources: Vec<String> = Vec::new();
    let mut error = None;

    for fragment in stream.collect().await {
        match fragment {
            AnswerFragment::Token(token) => answer.push_str(&token),
            AnswerFragment::Notice(text) => notice = Some(text),
            AnswerFragment::Citations(ids) => sources = ids,
            AnswerFragment::Error(message) => error = Some(message),
        }
    }

    let json = serde_json::json!({
        "answer": answer,
        "notice": notice,
        "sources": sources,
        "error": error,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);

    if let Some(message) = error {
        anyhow::bail!("{message}");
    }
    Ok(())
}
