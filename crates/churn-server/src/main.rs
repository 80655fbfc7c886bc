//! Churn Server - subscriber churn prediction service
//!
//! Computes reference quantiles and loads every scorer artifact before
//! binding the listener; a failure in either step exits without serving.

use anyhow::Result;
use churn_lib::{ServiceMetrics, StructuredLogger};
use churn_server::{api, startup, AppState, ServerConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting churn-server");

    let config = ServerConfig::load()?;
    info!(
        dataset = ?config.dataset_path,
        artifacts = ?config.artifacts_dir,
        "Server configured"
    );

    let metrics = ServiceMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);

    let service = startup::initialize(&config, &logger, &metrics)?;
    let state = Arc::new(AppState::new(service, metrics, logger.clone()));

    let addr = config.addr();
    logger.log_startup(SERVER_VERSION, &state.service.available_keys(), &addr);

    api::serve(&addr, state).await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
