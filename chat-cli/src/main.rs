//! # palaver
//!
//! Terminal driver for the Palaver chat engine.
//!
//! ## Commands
//!
//! - `history`: Print a conversation's history
//! - `chat`: Open a conversation, stream it, and send lines from stdin
//!
//! ## Example
//!
//! ```bash
//! # Show what has been said so far
//! palaver history c-42
//!
//! # Join as alice; every line typed is sent on Enter
//! palaver chat --identity alice c-42
//!
//! # Try it without a backend
//! palaver --mock chat --identity alice demo
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{chat, history};

/// Terminal driver for the Palaver chat engine.
#[derive(Parser, Debug)]
#[command(name = "palaver")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: palaver.toml in the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use mock transport and REST backend instead of a real server
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a conversation's history
    History {
        /// Conversation id
        conversation: String,
    },

    /// Chat in a conversation interactively
    Chat {
        /// Identity announced to the push channel
        #[arg(long, short)]
        identity: String,

        /// Conversation id
        conversation: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::resolve(cli.config.as_deref())?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::History { conversation } => {
            history::run(&config, &conversation, cli.mock).await?;
        }
        Commands::Chat {
            identity,
            conversation,
        } => {
            chat::run(config, &identity, &conversation, cli.mock).await?;
        }
    }

    Ok(())
}
