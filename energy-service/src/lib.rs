pub mod analytics;
pub mod api;
pub mod config;
pub mod dataset;
pub mod forecast;
pub mod ingest;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod sinks;
pub mod sources;
pub mod store;
pub mod transform;

pub use dataset::Dataset;
pub use pipeline::{Envelope, Pipeline, PipelineError};
