mod common;

use std::{fs, sync::Arc};

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use energy_service::{
    api::{create_router, AppState},
    config::AppConfig,
    ingest,
    store::DatasetStore,
};
use serde_json::Value;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

use common::{config_for, seed_data_dir, write_csv};

async fn app(cfg: AppConfig) -> Router {
    let dataset = ingest::load_dataset(&cfg, false).await.unwrap();
    let store = Arc::new(DatasetStore::new(dataset));
    create_router(AppState::new(cfg, store))
}

async fn seeded() -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    seed_data_dir(dir.path());
    let router = app(config_for(dir.path())).await;
    (dir, router)
}

async fn call(router: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    call(router, Method::GET, uri).await
}

#[tokio::test]
async fn health_reports_grid_size() {
    let (_dir, router) = seeded().await;
    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["gridSlots"], 4);
}

#[tokio::test]
async fn summary_is_keyed_by_channel() {
    let (_dir, router) = seeded().await;
    let (status, body) = get(&router, "/api/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tourA"]["name"], "Tour A");
    assert_eq!(body["tourA"]["avgPower"], 2.0);
    assert_eq!(body["tourA"]["readingCount"], 3);
    assert_eq!(body["tourB"]["avgPower"], 2.0);
}

#[tokio::test]
async fn malformed_filters_are_bad_requests() {
    let (_dir, router) = seeded().await;
    for uri in [
        "/api/summary?month=2025-13",
        "/api/hourly?start_date=2025-03-10&end_date=2025-03-01",
        "/api/weekly?day=9",
        "/api/timeseries?aggregation=yearly",
        "/api/distribution?bins=0",
        "/api/peak-analysis?top_n=many",
    ] {
        let (status, body) = get(&router, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn oversized_bin_counts_are_rejected() {
    let (_dir, router) = seeded().await;
    for uri in [
        "/api/distribution?bins=18446744073709551615",
        "/api/distribution?bins=8589934592",
        "/api/distribution?bins=1001",
    ] {
        let (status, body) = get(&router, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].as_str().unwrap().contains("at most"), "{uri}");
    }

    let (status, body) = get(&router, "/api/distribution?bins=1000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tourB"]["histogram"].as_array().unwrap().len(), 1000);
}

#[tokio::test]
async fn empty_filter_parameters_are_ignored() {
    let (_dir, router) = seeded().await;
    let (status, body) = get(&router, "/api/summary?month=&day=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tourA"]["readingCount"], 3);
}

#[tokio::test]
async fn hourly_for_month_without_data_is_all_zero() {
    let (_dir, router) = seeded().await;
    let (status, body) = get(&router, "/api/hourly?month=2025-04").await;
    assert_eq!(status, StatusCode::OK);
    let hours = body.as_array().unwrap();
    assert_eq!(hours.len(), 24);
    assert!(hours.iter().all(|h| h["tourA"] == 0.0 && h["tourB"] == 0.0));
}

#[tokio::test]
async fn raw_timeseries_keeps_missing_slots_as_null() {
    let (_dir, router) = seeded().await;
    let (status, body) = get(&router, "/api/timeseries?aggregation=raw").await;
    assert_eq!(status, StatusCode::OK);
    let points = body.as_array().unwrap();
    assert_eq!(points.len(), 4);
    assert_eq!(points[0]["timestamp"], "2025-03-03 00:00:00");
    assert!(points[2]["tourA"].is_null());
    assert_eq!(points[2]["tourB"], 2.0);
}

#[tokio::test]
async fn weekday_filter_selects_monday() {
    let (_dir, router) = seeded().await;
    let (_, monday) = get(&router, "/api/comparison?day=0").await;
    assert_eq!(monday["pairedCount"], 3);

    let (_, weekend) = get(&router, "/api/comparison?day=5,6").await;
    assert_eq!(weekend["pairedCount"], 0);
}

#[tokio::test]
async fn data_info_exposes_ingest_bookkeeping() {
    let (_dir, router) = seeded().await;
    let (status, body) = get(&router, "/api/data-info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalRecords"], 4);
    assert_eq!(body["availableMonths"], serde_json::json!(["2025-03"]));
    assert_eq!(body["ingest"]["filesSkipped"], 1);
    assert_eq!(body["fingerprint"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn dashboard_bundles_every_section() {
    let (_dir, router) = seeded().await;
    let (status, body) = get(&router, "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    for key in [
        "generatedAt",
        "tourSummary",
        "hourlyData",
        "weeklyData",
        "timeSeriesData",
        "monthlyData",
        "keyInsights",
    ] {
        assert!(!body[key].is_null(), "missing {key}");
    }
    assert_eq!(body["hourlyData"].as_array().unwrap().len(), 24);
    assert_eq!(body["weeklyData"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn forecast_scenarios() {
    let data = tempdir().unwrap();
    let forecasts = tempdir().unwrap();
    seed_data_dir(data.path());
    fs::write(
        forecasts.path().join("forecast_1_week.json"),
        r#"{
            "tourA": {"model": "ets", "dates": ["2025-03-04", "2025-03-05"], "predicted": [2.0, 4.0], "actual": [2.0, 2.0]},
            "tourB": {"dates": ["2025-03-04"], "predicted": [1.0], "actual": [1.0]}
        }"#,
    )
    .unwrap();
    let mut cfg = config_for(data.path());
    cfg.data.forecast_dir = Some(forecasts.path().to_path_buf());
    let router = app(cfg).await;

    let (status, body) = get(&router, "/api/forecast/1_week").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scenario"], "1_week");
    assert_eq!(body["accuracy"]["tourA"]["points"], 2);
    assert_eq!(body["accuracy"]["tourA"]["mae"], 1.0);
    assert_eq!(body["accuracy"]["tourB"]["mae"], 0.0);

    let (status, _) = get(&router, "/api/forecast/1_month").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(&router, "/api/forecast/2_weeks").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("2_weeks"));
}

#[tokio::test]
async fn reload_swaps_in_new_files() {
    let (dir, router) = seeded().await;
    write_csv(
        &dir.path().join("2025-04").join("export_02.csv"),
        &["01/04/2025;00:00:00;6;6"],
    );

    let (status, _) = get(&router, "/api/hourly?month=2025-04").await;
    assert_eq!(status, StatusCode::OK);

    let (status, info) = call(&router, Method::POST, "/api/reload").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["ingest"]["filesLoaded"], 2);
    assert_eq!(
        info["availableMonths"],
        serde_json::json!(["2025-03", "2025-04"])
    );

    let (_, hours) = get(&router, "/api/hourly?month=2025-04").await;
    assert_eq!(hours[0]["tourA"], 6.0);
}

#[tokio::test]
async fn reload_failure_keeps_serving_previous_dataset() {
    let (dir, router) = seeded().await;
    fs::remove_dir_all(dir.path()).unwrap();

    let (status, body) = call(&router, Method::POST, "/api/reload").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());

    let (status, summary) = get(&router, "/api/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["tourA"]["readingCount"], 3);
}
