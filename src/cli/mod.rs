//! CLI surface for ragchat.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Chat with your documents: ingest a folder, then ask questions.
#[derive(Debug, Parser)]
#[command(name = "ragchat")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ingest documents into the knowledge base
    Ingest {
        /// Directory or file to ingest (defaults to ./docs)
        path: Option<PathBuf>,

        /// Override the embedding batch size
        #[arg(long)]
        batch_size: Option<usize>,

        /// Clear the collection before ingesting
        #[arg(long)]
        rebuild: bool,
    },

    /// Ask a single question and print the answer with sources
    Ask {
        /// The question to answer
        #[arg(required = true)]
        question: String,
    },

    /// Start an interactive chat session
    Chat {
        /// Print the full answer at once instead of streaming tokens
        #[arg(long)]
        no_stream: bool,
    },

    /// Check infrastructure status (vector store, configuration)
    Status,
}
