mod config;
mod enrichment;
mod http;
mod indexer;
mod models;
mod service;
mod state;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::ApiConfig;
use crate::enrichment::HttpEnricher;
use crate::indexer::IndexerClient;
use crate::service::NftService;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = ApiConfig::load().context("Failed to load configuration")?;

    let indexer = IndexerClient::new(&config.indexer.endpoint, config.indexer.request_timeout())
        .context("Failed to initialize indexer client")?;
    let enricher = HttpEnricher::new(
        &config.enrichment.profile_service_url,
        config.enrichment.request_timeout(),
    )
    .context("Failed to initialize enrichment client")?;

    let indexer_endpoint = indexer.endpoint().clone();
    let service = NftService::new(indexer, enricher);
    let app_state = AppState::new(service, indexer_endpoint);

    let listener = TcpListener::bind(config.server.address())
        .await
        .context("Failed to bind HTTP listener")?;
    let local_addr = listener
        .local_addr()
        .context("Failed to obtain listener address")?;
    info!("Marketplace API listening on {local_addr}");

    let router: Router = http::router(app_state);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server exited with error")?;

    Ok(())
}

fn init_tracing() {
    let default_filter = "info";
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
    assert!(!filter.is_empty(), "Tracing filter must not be empty");
    assert!(filter.len() < 256, "Tracing filter length exceeds bounds");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .compact()
        .init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        return;
    }
    info!("Shutdown signal received");
}
