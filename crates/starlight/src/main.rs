//! Starlight - MCP tool server over HTTP and Server-Sent Events.
//!
//! This is the entry point for the `starlight` binary.

mod serve;

use clap::Parser;
use starlight_mcp::ServerConfig;
use starlight_util::{LogConfig, LogLevel};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "starlight")]
#[command(author, version, about = "MCP tool server over HTTP and SSE", long_about = None)]
struct Cli {
    /// Host to bind to [default: localhost]
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to [default: 38000]
    #[arg(short, long)]
    port: Option<u16>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    /// Apply command-line overrides on top of file configuration.
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.debug {
            config.log_level = LogLevel::Debug;
        }
    }
}

async fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path).await?,
        None => ServerConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).await?;

    let log_config = LogConfig {
        level: config.log_level,
        include_location: config.log_level == LogLevel::Debug,
        ..LogConfig::default()
    };
    if let Err(e) = starlight_util::log::init(log_config) {
        eprintln!("Warning: Could not initialize logging: {e}");
    }
    // Configuration is read before the subscriber exists.
    if let Some(path) = &cli.config {
        info!(path = %path.display(), "Loaded configuration");
    }

    serve::run(config).await
}
