//! Sealchat command-line interface.
//!
//! An interactive terminal client over the secure-messaging core. The key
//! is created automatically on first run and reused afterwards; replies
//! stay sealed until explicitly decrypted.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

/// Sealchat - rephrase, seal, and read messages locally
#[derive(Parser)]
#[command(name = "sealchat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Data directory path
    #[arg(short, long, default_value = "~/.sealchat")]
    data_dir: String,

    /// Skip the remote enhancement service (messages are sealed as typed)
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    commands::run(&cli.data_dir, cli.offline).await
}
