use std::path::PathBuf;
use std::sync::Arc;

use code_agent::config::{AgentConfig, log_dir_from_env};
use code_agent::pipeline::OrderProcessor;
use code_agent::server::{build_processor, order_routes};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    let _ = rustls::crypto::ring::default_provider().install_default();

    // Local development convenience; absent in production.
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing(log_dir_from_env());
    let (config, processor) = bootstrap().await?;
    let app = order_routes(Arc::new(processor), config.agent_type.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Code agent stopped");
    Ok(())
}

/// Load configuration and wire the order pipeline.
async fn bootstrap() -> code_agent::error::Result<(AgentConfig, OrderProcessor)> {
    let config = AgentConfig::from_env()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        agent = %config.agent_type,
        model = %config.llm.model,
        keywords = config.keywords.len(),
        "Code agent starting"
    );

    let processor = build_processor(&config).await?;
    Ok((config, processor))
}

/// Stderr logging, plus daily-rotated files when a log directory is set.
///
/// The returned guard flushes the file writer and must outlive the server.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "code-agent.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .init();

    guard
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
