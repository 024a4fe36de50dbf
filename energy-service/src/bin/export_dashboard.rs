use anyhow::{bail, Result};
use energy_client::Filter;
use energy_service::{
    analytics::MetricsEngine, config::AppConfig, ingest, observability, pipeline::Sink,
    sinks::DashboardJsonSink,
};
use std::env;

/// Ingests the data tree once and writes the dashboard document.
///
/// usage: export_dashboard <output.json> [YYYY-MM]
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: export_dashboard <output.json> [YYYY-MM]");
    }
    let output = &args[1];
    let filter = Filter::from_params(args.get(2).map(String::as_str), None, None, None)?;

    let cfg = AppConfig::load()?;
    let dataset = ingest::load_dataset(&cfg, true).await?;

    let engine = MetricsEngine::new(cfg.metrics_engine.clone());
    let document = engine.dashboard(&dataset, &filter);
    DashboardJsonSink::new(output).write(&document).await?;

    tracing::info!(
        output = %output,
        slots = dataset.grid().len(),
        fingerprint = %dataset.fingerprint(),
        "dashboard export complete"
    );
    Ok(())
}
