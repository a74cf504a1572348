//! Ask command implementation: one question, one answer.

use anyhow::Result;

use crate::cli::output::format_answer;
use crate::models::Config;
use crate::services::{
    ConversationMemory, OpenAiChatClient, OpenAiEmbeddingClient, QueryEngine, create_backend,
};

pub async fn handle_ask(question: String, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let api_key = Config::require_api_key()?;

    let embedder = OpenAiEmbeddingClient::new(&config.embedding, api_key.clone())?;
    let model = OpenAiChatClient::new(&config.llm, api_key)?;
    let store = create_backend(&config.vector_store, u64::from(config.embedding.dimension))?;

    let memory = ConversationMemory::new(config.query.max_history_turns);
    let mut engine = QueryEngine::new(
        &embedder,
        store.as_ref(),
        &model,
        memory,
        config.query.top_k,
    );

    let result = engine.answer(&question).await?;
    print!("{}", format_answer(&result));
    println!("({}ms)", result.duration_ms);

    Ok(())
}
