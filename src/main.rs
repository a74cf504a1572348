use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use ragchat::cli::commands::{handle_ask, handle_chat, handle_ingest, handle_status};
use ragchat::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    tokio::select! {
        result = run_command(cli.command, cli.verbose) => {
            result?;
        }
        _ = shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, exiting...");
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "ragchat=debug" } else { "ragchat=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_command(command: Commands, verbose: bool) -> Result<()> {
    match command {
        Commands::Ingest {
            path,
            batch_size,
            rebuild,
        } => {
            handle_ingest(path, batch_size, rebuild, verbose).await?;
        }
        Commands::Ask { question } => {
            handle_ask(question, verbose).await?;
        }
        Commands::Chat { no_stream } => {
            handle_chat(no_stream, verbose).await?;
        }
        Commands::Status => {
            handle_status(verbose).await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
