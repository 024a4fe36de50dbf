pub mod dashboard_json;
pub mod processed_csv;

pub use dashboard_json::DashboardJsonSink;
pub use processed_csv::ProcessedCsvCache;
