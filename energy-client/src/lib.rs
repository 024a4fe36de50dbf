//! Shared vocabulary for the Tour A / Tour B power-meter analytics.
//!
//! The service crate builds these types during ingestion and the metrics
//! engine reads them; nothing in here does I/O.

pub mod domain;
pub mod query;

pub use domain::{
    Channel, ChannelSeries, ForecastArtifact, ForecastScenario, ForecastSeries, QualityReport,
    SeriesError, Slot, SlotFlag, TimeGrid,
};
pub use query::{DateRange, Filter, FilterError, YearMonth};
