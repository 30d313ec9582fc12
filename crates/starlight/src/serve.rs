//! Server run loop.

use anyhow::Context;
use starlight_mcp::{http_serve, ServerConfig, ToolRegistry};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Serve until Ctrl+C (or SIGTERM on unix).
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let registry = ToolRegistry::from_tools(starlight_tools::builtin_tools())
        .context("Failed to register built-in tools")?;

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    print_banner(&config, &registry);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_signal().await;
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    http_serve::serve_on(listener, &config, registry, shutdown).await?;
    info!("Server stopped");
    Ok(())
}

fn print_banner(config: &ServerConfig, registry: &ToolRegistry) {
    let base = format!("http://{}", config.bind_address());

    println!("{}", "=".repeat(60));
    println!("{} v{}", config.name, config.version);
    println!("SSE endpoint:  {base}/sse");
    println!("POST endpoint: {base}/sse");
    println!("Health check:  {base}/health");
    println!(
        "Tools ({}):     {}",
        registry.len(),
        registry.names().join(", ")
    );
    println!("Press Ctrl+C to stop");
    println!("{}", "=".repeat(60));
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
