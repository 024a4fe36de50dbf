use std::net::SocketAddr;

use anyhow::Context;
use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

fn describe() {
    metrics::describe_counter!("ingest_files_loaded_total", "Data files read and normalized");
    metrics::describe_counter!("ingest_files_skipped_total", "Data files skipped as unreadable or malformed");
    metrics::describe_counter!(
        "ingest_rows_dropped_total",
        "Rows dropped during temporal cleaning, by reason"
    );
    metrics::describe_counter!("sanitize_rejected_total", "Readings nulled by the value sanitizer");
    metrics::describe_counter!("api_requests_total", "HTTP API requests, by endpoint");
    metrics::describe_gauge!("dataset_grid_slots", "Grid slots in the dataset being served");
}

/// Installs the Prometheus recorder and serves `/metrics` on `bind_addr`.
pub fn init(bind_addr: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .with_context(|| format!("invalid metrics bind address '{bind_addr}'"))?;
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus metrics recorder")?;

    // A second init keeps the first handle.
    let _ = PROM_HANDLE.set(handle);
    describe();

    tokio::spawn(async move {
        let app = Router::new().route("/metrics", get(metrics_handler));

        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                tracing::info!(%addr, "metrics endpoint listening");
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    tracing::error!(error = %e, "metrics server error");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to bind metrics listener");
            }
        }
    });
    Ok(())
}

async fn metrics_handler() -> String {
    PROM_HANDLE.get().map(PrometheusHandle::render).unwrap_or_default()
}
