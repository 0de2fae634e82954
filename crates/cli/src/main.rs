//! Amino Chat CLI: the main entry point.
//!
//! Commands:
//! - `serve`    : Start the HTTP gateway and chat widget
//! - `ask`      : Run a message through the full pipeline
//! - `classify` : Show which category a message falls into
//! - `doctor`   : Diagnose configuration, store, and provider
//! - `onboard`  : Write a default config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "aminochat",
    about = "Amino Chat — hospital information assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.aminochat/config.toml)
    #[arg(short, long, global = true, env = "AMINOCHAT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Answer a message; reads stdin line by line when no message is given
    Ask {
        message: Option<String>,
    },

    /// Classify a message without calling the store or the model
    Classify {
        message: String,
    },

    /// Diagnose system health
    Doctor,

    /// Write a default configuration file
    Onboard,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Ask { message } => commands::ask::run(config_path, message).await?,
        Commands::Classify { message } => commands::classify::run(config_path, &message)?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Onboard => commands::onboard::run(config_path).await?,
    }

    Ok(())
}
