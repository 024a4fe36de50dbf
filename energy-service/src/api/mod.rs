//! HTTP surface over the metrics engine.

pub mod error;
pub mod handlers;
pub mod params;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{analytics::MetricsEngine, config::AppConfig, forecast::ForecastRepository, store::DatasetStore};

pub use error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DatasetStore>,
    pub engine: Arc<MetricsEngine>,
    pub forecasts: ForecastRepository,
    pub config: Arc<AppConfig>,
    pub reload_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<DatasetStore>) -> Self {
        Self {
            engine: Arc::new(MetricsEngine::new(config.metrics_engine.clone())),
            forecasts: ForecastRepository::new(config.data.forecast_dir.clone()),
            config: Arc::new(config),
            store,
            reload_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/summary", get(handlers::summary))
        .route("/api/hourly", get(handlers::hourly))
        .route("/api/weekly", get(handlers::weekly))
        .route("/api/monthly", get(handlers::monthly))
        .route("/api/timeseries", get(handlers::timeseries))
        .route("/api/distribution", get(handlers::distribution))
        .route("/api/peak-analysis", get(handlers::peak_analysis))
        .route("/api/data-quality", get(handlers::data_quality))
        .route("/api/comparison", get(handlers::comparison))
        .route("/api/data-info", get(handlers::data_info))
        .route("/api/insights", get(handlers::insights))
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/forecast/:scenario", get(handlers::forecast))
        .route("/api/reload", post(handlers::reload))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
