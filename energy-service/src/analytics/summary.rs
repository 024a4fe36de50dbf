use energy_client::{query::day_index, Channel, Filter};
use serde::Serialize;

use super::{stats, MetricsEngine, PerChannel, View};
use crate::dataset::Dataset;

const HOURS_PER_DAY: f64 = 24.0;
const DAYS_PER_MONTH: f64 = 30.0;

/// Headline figures for one channel over the retained slots.
///
/// All fields are zero when nothing is retained.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    pub name: String,
    pub avg_power: f64,
    pub max_power: f64,
    pub min_power: f64,
    pub std_power: f64,
    pub weekday_avg: f64,
    pub weekend_avg: f64,
    /// `avg / max`, 0 when max is 0.
    pub load_factor: f64,
    /// `max / avg`, 0 when avg is 0.
    pub peak_to_avg_ratio: f64,
    /// Average power times the hours covered by present readings.
    pub total_energy_kwh: f64,
    pub estimated_daily_kwh: f64,
    pub estimated_monthly_kwh: f64,
    /// Fraction of retained slots with a reading.
    pub data_coverage: f64,
    pub reading_count: usize,
}

pub(crate) fn summarize(view: &View<'_>, channel: Channel) -> SummaryMetrics {
    let mut all = Vec::new();
    let mut weekday = Vec::new();
    let mut weekend = Vec::new();
    for (ts, v) in view.readings(channel) {
        all.push(v);
        if day_index(ts.weekday()) < 5 {
            weekday.push(v);
        } else {
            weekend.push(v);
        }
    }

    let name = channel.label().to_string();
    if all.is_empty() {
        return SummaryMetrics {
            name,
            ..SummaryMetrics::default()
        };
    }

    let avg = stats::mean(&all);
    let max = stats::max(&all);
    let slot_hours = view.dataset().grid().slot_hours();
    SummaryMetrics {
        name,
        avg_power: avg,
        max_power: max,
        min_power: stats::min(&all),
        std_power: stats::std_dev(&all),
        weekday_avg: stats::mean(&weekday),
        weekend_avg: stats::mean(&weekend),
        load_factor: stats::ratio(avg, max),
        peak_to_avg_ratio: stats::ratio(max, avg),
        total_energy_kwh: avg * all.len() as f64 * slot_hours,
        estimated_daily_kwh: avg * HOURS_PER_DAY,
        estimated_monthly_kwh: avg * HOURS_PER_DAY * DAYS_PER_MONTH,
        data_coverage: stats::ratio(all.len() as f64, view.len() as f64),
        reading_count: all.len(),
    }
}

impl MetricsEngine {
    pub fn summary(&self, dataset: &Dataset, filter: &Filter) -> PerChannel<SummaryMetrics> {
        let view = View::new(dataset, filter);
        PerChannel::from_fn(|c| summarize(&view, c))
    }
}
