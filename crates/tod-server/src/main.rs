//! tod-server: couples truth-or-dare card service

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tod_server::ServerConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tod-server")]
#[command(version, about = "Serve couples truth-or-dare cards over HTTP")]
struct Args {
    /// Config file (defaults to ./tod.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides config and TOD_BIND
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("tod-server v{} starting", env!("CARGO_PKG_VERSION"));

    tod_server::run(config).await
}
