//! MoodLens server binary
//!
//! Starts the HTTP server for mood analysis, crisis detection and
//! summarization.

use anyhow::{Context, Result};
use clap::Parser;
use moodlens_server::{config::ServerConfig, start_server};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// MoodLens - Normalized emotion, crisis and summary answers from hosted models.
#[derive(Debug, Parser)]
#[command(name = "moodlens-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MOODLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind address (e.g. 0.0.0.0:8000)
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() {
    // Log to stderr; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => {
            warn!("No config file specified, using default Hugging Face providers");
            warn!("Usage: moodlens-server --config <path-to-config.toml>");
            ServerConfig::default_config()
        }
    };

    if let Some(addr) = cli.bind {
        config.bind_address = addr.ip().to_string();
        config.bind_port = addr.port();
    }

    start_server(config).await.context("running server")?;

    Ok(())
}
