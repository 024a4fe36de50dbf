//! Metrics engine: pure functions of (dataset, filter) returning
//! serializable value objects. Nothing here caches or mutates.

pub mod comparison;
pub mod distribution;
pub mod info;
pub mod insights;
pub mod patterns;
pub mod peaks;
pub mod stats;
pub mod summary;
pub mod timeseries;
mod view;

use energy_client::Channel;
use serde::Serialize;
use time::{format_description::FormatItem, macros::format_description, PrimitiveDateTime};

use crate::config::MetricsEngineConfig;

pub use comparison::ComparisonMetrics;
pub use distribution::{DistributionMetrics, HistogramBin, MAX_BINS};
pub use info::{DataInfo, DataQuality, DateSpan};
pub use insights::{DashboardDocument, KeyInsight};
pub use patterns::{HourlyEntry, MonthlyEntry, WeeklyEntry};
pub use peaks::{DailyPeak, HourlyMean, PeakRanking};
pub use summary::SummaryMetrics;
pub use timeseries::{Aggregation, TimeseriesPoint};
pub(crate) use view::View;

pub(crate) const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

pub fn format_timestamp(ts: PrimitiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).unwrap_or_else(|_| ts.to_string())
}

/// A value computed once per channel, serialized as `{"tourA": .., "tourB": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerChannel<T> {
    pub tour_a: T,
    pub tour_b: T,
}

impl<T> PerChannel<T> {
    pub fn from_fn<F: FnMut(Channel) -> T>(mut f: F) -> Self {
        Self {
            tour_a: f(Channel::A),
            tour_b: f(Channel::B),
        }
    }

    pub fn get(&self, channel: Channel) -> &T {
        match channel {
            Channel::A => &self.tour_a,
            Channel::B => &self.tour_b,
        }
    }
}

/// Entry point for every metric family. Stateless apart from its
/// configuration, so one instance is shared by all requests.
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    config: MetricsEngineConfig,
}

impl MetricsEngine {
    pub fn new(config: MetricsEngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MetricsEngineConfig {
        &self.config
    }
}
