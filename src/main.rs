use anyhow::{Context, Result};
use axum::http::HeaderValue;
use clap::Parser;
use mykad_reader::config::Config;
use mykad_reader::server::{self, AppState, MYKAD_READER_PATH};
use mykad_reader::{validate_layout, version, PcscBackend, ScanOptions};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env has to be loaded before clap reads env fallbacks
    let _ = dotenvy::dotenv();
    let config = Config::parse();

    // RUST_LOG wins over --log-level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    validate_layout().context("field offset table does not fit the card file layout")?;

    let origin = config.api_origin();
    info!(origin = ?origin, version = version(), "Loaded origin");
    let allowed_origin = HeaderValue::from_str(origin)
        .with_context(|| format!("API_ORIGIN {:?} is not a valid header value", origin))?;

    let state = AppState::new(Arc::new(PcscBackend), ScanOptions { dump: config.dump });
    let app = server::router(state, allowed_origin);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(addr = %config.bind, path = MYKAD_READER_PATH, "MyKad reader listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
