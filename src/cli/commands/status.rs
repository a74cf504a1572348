//! Status command implementation.

use anyhow::Result;

use crate::cli::output::{StatusInfo, format_status};
use crate::models::Config;
use crate::services::create_backend;

pub async fn handle_status(_verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let api_key_present = Config::require_api_key().is_ok();

    let (connected, chunks_indexed) =
        match create_backend(&config.vector_store, u64::from(config.embedding.dimension)) {
            Ok(store) => {
                let connected = store.health_check().await.unwrap_or(false);
                let chunks = if connected {
                    store.count().await.unwrap_or(0)
                } else {
                    0
                };
                (connected, chunks)
            }
            Err(_) => (false, 0),
        };

    let status = StatusInfo {
        vector_store_url: config.vector_store.url.clone(),
        vector_store_connected: connected,
        collection: config.vector_store.collection.clone(),
        chunks_indexed,
        embedding_model: config.embedding.model.clone(),
        llm_model: config.llm.model.clone(),
        api_key_present,
    };

    print!("{}", format_status(&status));

    if !connected || !api_key_present || chunks_indexed == 0 {
        eprintln!();
        if !connected {
            eprintln!(
                "Warning: Qdrant not reachable at {}. Start with: docker compose up -d qdrant",
                config.vector_store.url
            );
        }
        if !api_key_present {
            eprintln!("Warning: OPENAI_API_KEY is not set.");
        }
        if connected && chunks_indexed == 0 {
            eprintln!("Hint: the knowledge base is empty. Run: ragchat ingest <path>");
        }
    }

    Ok(())
}
