//! Ingest command implementation.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::output::format_ingest_report;
use crate::models::Config;
use crate::services::{IngestionPipeline, OpenAiEmbeddingClient, TextChunker, create_backend};
use crate::sources::LocalSource;

const DEFAULT_DOCS_DIR: &str = "docs";

pub async fn handle_ingest(
    path: Option<PathBuf>,
    batch_size: Option<usize>,
    rebuild: bool,
    verbose: bool,
) -> Result<()> {
    let config = Config::load()?;
    let api_key = Config::require_api_key()?;
    let start_time = Instant::now();

    let root = path.unwrap_or_else(|| PathBuf::from(DEFAULT_DOCS_DIR));
    let batch_size = batch_size.unwrap_or(config.ingestion.batch_size);
    if batch_size == 0 {
        anyhow::bail!("batch size must be at least 1");
    }

    let source = LocalSource::from_config(root.clone(), &config.ingestion);
    let documents = source.documents()?;

    if verbose {
        println!("Found {} files under {}", documents.len(), root.display());
    }

    let chunker = TextChunker::from_config(&config.ingestion)?;
    let embedder = OpenAiEmbeddingClient::new(&config.embedding, api_key)?;
    let store = create_backend(&config.vector_store, u64::from(config.embedding.dimension))?;

    if rebuild {
        println!("Rebuilding collection '{}'", store.collection());
        store.clear_collection().await?;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("invalid progress template")?,
    );
    spinner.set_message(format!("Ingesting {} document(s)...", documents.len()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let pipeline = IngestionPipeline::new(&chunker, &embedder, store.as_ref(), batch_size);
    let result = pipeline.ingest(documents).await;
    spinner.finish_and_clear();

    let report = result?;
    print!(
        "{}",
        format_ingest_report(&report, start_time.elapsed().as_millis() as u64)
    );

    Ok(())
}
