use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use super::{
    error::{ApiError, ApiResult},
    params::MetricsQuery,
    AppState,
};
use crate::{
    analytics::{
        ComparisonMetrics, DashboardDocument, DataInfo, DataQuality, DistributionMetrics,
        HourlyEntry, KeyInsight, MonthlyEntry, PeakRanking, PerChannel, SummaryMetrics,
        TimeseriesPoint, WeeklyEntry,
    },
    forecast::ForecastReport,
    ingest,
};

fn count(endpoint: &'static str) {
    metrics::counter!("api_requests_total", "endpoint" => endpoint).increment(1);
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    count("health");
    let dataset = state.store.snapshot();
    Json(json!({
        "status": "ok",
        "gridSlots": dataset.grid().len(),
    }))
}

pub async fn summary(
    State(state): State<AppState>,
    Query(q): Query<MetricsQuery>,
) -> ApiResult<Json<PerChannel<SummaryMetrics>>> {
    count("summary");
    let filter = q.filter()?;
    Ok(Json(state.engine.summary(&state.store.snapshot(), &filter)))
}

pub async fn hourly(
    State(state): State<AppState>,
    Query(q): Query<MetricsQuery>,
) -> ApiResult<Json<Vec<HourlyEntry>>> {
    count("hourly");
    let filter = q.filter()?;
    Ok(Json(state.engine.hourly(&state.store.snapshot(), &filter)))
}

pub async fn weekly(
    State(state): State<AppState>,
    Query(q): Query<MetricsQuery>,
) -> ApiResult<Json<Vec<WeeklyEntry>>> {
    count("weekly");
    let filter = q.filter()?;
    Ok(Json(state.engine.weekly(&state.store.snapshot(), &filter)))
}

pub async fn monthly(
    State(state): State<AppState>,
    Query(q): Query<MetricsQuery>,
) -> ApiResult<Json<Vec<MonthlyEntry>>> {
    count("monthly");
    let filter = q.filter()?;
    Ok(Json(state.engine.monthly(&state.store.snapshot(), &filter)))
}

pub async fn timeseries(
    State(state): State<AppState>,
    Query(q): Query<MetricsQuery>,
) -> ApiResult<Json<Vec<TimeseriesPoint>>> {
    count("timeseries");
    let filter = q.filter()?;
    let aggregation = q.aggregation()?;
    Ok(Json(state.engine.timeseries(&state.store.snapshot(), &filter, aggregation)))
}

pub async fn distribution(
    State(state): State<AppState>,
    Query(q): Query<MetricsQuery>,
) -> ApiResult<Json<PerChannel<DistributionMetrics>>> {
    count("distribution");
    let filter = q.filter()?;
    let bins = q.bins()?;
    Ok(Json(state.engine.distribution(&state.store.snapshot(), &filter, bins)))
}

pub async fn peak_analysis(
    State(state): State<AppState>,
    Query(q): Query<MetricsQuery>,
) -> ApiResult<Json<PerChannel<PeakRanking>>> {
    count("peak_analysis");
    let filter = q.filter()?;
    let top_n = q.top_n()?;
    Ok(Json(state.engine.peak_analysis(&state.store.snapshot(), &filter, top_n)))
}

pub async fn data_quality(
    State(state): State<AppState>,
    Query(q): Query<MetricsQuery>,
) -> ApiResult<Json<PerChannel<DataQuality>>> {
    count("data_quality");
    let filter = q.filter()?;
    Ok(Json(state.engine.data_quality(&state.store.snapshot(), &filter)))
}

pub async fn comparison(
    State(state): State<AppState>,
    Query(q): Query<MetricsQuery>,
) -> ApiResult<Json<ComparisonMetrics>> {
    count("comparison");
    let filter = q.filter()?;
    Ok(Json(state.engine.comparison(&state.store.snapshot(), &filter)))
}

pub async fn data_info(State(state): State<AppState>) -> Json<DataInfo> {
    count("data_info");
    Json(state.engine.data_info(&state.store.snapshot()))
}

pub async fn insights(
    State(state): State<AppState>,
    Query(q): Query<MetricsQuery>,
) -> ApiResult<Json<Vec<KeyInsight>>> {
    count("insights");
    let filter = q.filter()?;
    Ok(Json(state.engine.insights(&state.store.snapshot(), &filter)))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Query(q): Query<MetricsQuery>,
) -> ApiResult<Json<DashboardDocument>> {
    count("dashboard");
    let filter = q.filter()?;
    Ok(Json(state.engine.dashboard(&state.store.snapshot(), &filter)))
}

pub async fn forecast(
    State(state): State<AppState>,
    Path(scenario): Path<String>,
) -> ApiResult<Json<ForecastReport>> {
    count("forecast");
    Ok(Json(state.forecasts.load(&scenario).await?))
}

/// Re-runs ingestion from the raw files and swaps the result in. Concurrent
/// reloads are serialized; readers keep the previous snapshot until the swap.
pub async fn reload(State(state): State<AppState>) -> ApiResult<Json<DataInfo>> {
    count("reload");
    let _guard = state.reload_lock.lock().await;
    let dataset = ingest::load_dataset(&state.config, false)
        .await
        .map_err(ApiError::from)?;
    let info = state.engine.data_info(&dataset);
    let previous = state.store.replace(dataset);
    tracing::info!(
        previous = %previous.fingerprint(),
        current = %info.fingerprint,
        slots = info.total_records,
        "dataset reloaded"
    );
    Ok(Json(info))
}
