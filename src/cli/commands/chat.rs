//! Interactive chat session over the knowledge base.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use console::style;
use tracing::error;

use crate::cli::output::{format_answer, format_sources_line};
use crate::error::QueryError;
use crate::models::Config;
use crate::services::{
    ConversationMemory, OpenAiChatClient, OpenAiEmbeddingClient, QueryEngine, create_backend,
};

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "q"];

pub async fn handle_chat(no_stream: bool, verbose: bool) -> Result<()> {
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

    println!("Chat with your documents. Type 'exit' to leave.");
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{} ", style("You:").bold().cyan());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let question = line?.trim().to_string();

        if question.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&question.to_lowercase().as_str()) {
            println!("Goodbye.");
            break;
        }

        let outcome = if no_stream {
            engine.answer(&question).await.map(|result| {
                print!("{}", format_answer(&result));
                result
            })
        } else {
            print!("{} ", style("Assistant:").bold().green());
            io::stdout().flush()?;
            let streamed = engine
                .answer_streaming(&question, |fragment| {
                    print!("{fragment}");
                    let _ = io::stdout().flush();
                })
                .await;
            match streamed {
                Ok(result) => {
                    println!();
                    print!("{}", format_sources_line(&result));
                    Ok(result)
                }
                Err(e) => {
                    println!();
                    Err(e)
                }
            }
        };

        match outcome {
            Ok(result) => {
                if verbose {
                    println!("{}", style(format!("({}ms)", result.duration_ms)).dim());
                }
            }
            Err(QueryError::EmptyIndex) => {
                println!("{}", QueryError::EmptyIndex);
            }
            Err(e) => {
                error!(error = %e, "query failed");
                println!("Sorry, I ran into a problem answering that. Please try again.");
            }
        }
        println!();
    }

    Ok(())
}
