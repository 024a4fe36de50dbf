use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use energy_service::{
    api::{self, AppState},
    config::AppConfig,
    dataset::Dataset,
    ingest, metrics_server, observability,
    store::DatasetStore,
};
use time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    // Serve an empty dataset rather than exiting so POST /api/reload can
    // recover once files appear.
    let dataset = match ingest::load_dataset(&cfg, true).await {
        Ok(ds) => ds,
        Err(e) => {
            tracing::error!(error = %e, "initial ingestion failed; serving an empty dataset");
            Dataset::empty(Duration::minutes(cfg.cleaning.interval_minutes))
        }
    };
    let store = Arc::new(DatasetStore::new(dataset));

    let addr: SocketAddr = format!("{}:{}", cfg.api.host, cfg.api.port)
        .parse()
        .context("invalid api.host / api.port")?;
    let app = api::create_router(AppState::new(cfg, store));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "energy-service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("energy-service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    tracing::info!("shutdown signal received");
}
