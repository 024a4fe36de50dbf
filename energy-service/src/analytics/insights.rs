use energy_client::{Channel, Filter};
use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use super::{
    info::{date_span, DateSpan},
    patterns::hourly_means,
    Aggregation, HourlyEntry, MetricsEngine, MonthlyEntry, PerChannel, SummaryMetrics,
    TimeseriesPoint, View, WeeklyEntry,
};
use crate::dataset::Dataset;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyInsight {
    pub title: String,
    pub value: String,
    pub description: String,
}

impl KeyInsight {
    fn new(title: &str, value: String, description: String) -> Self {
        Self {
            title: title.to_string(),
            value,
            description,
        }
    }
}

/// Everything the dashboard renders, in one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDocument {
    pub generated_at: String,
    pub date_range: Option<DateSpan>,
    pub tour_summary: Vec<SummaryMetrics>,
    pub hourly_data: Vec<HourlyEntry>,
    pub weekly_data: Vec<WeeklyEntry>,
    pub time_series_data: Vec<TimeseriesPoint>,
    pub monthly_data: Vec<MonthlyEntry>,
    pub key_insights: Vec<KeyInsight>,
}

/// Percentage drop from `from` to `to`, 0 when `from` is not positive.
fn drop_pct(from: f64, to: f64) -> f64 {
    if from > 0.0 {
        (from - to) / from * 100.0
    } else {
        0.0
    }
}

/// Hour with the highest mean reading; hour 0 when the channel has none.
fn peak_hour(view: &View<'_>, channel: Channel) -> usize {
    let means = hourly_means(view, channel);
    let mut best: Option<(usize, f64)> = None;
    for (h, acc) in means.iter().enumerate().filter(|(_, a)| a.count() > 0) {
        if best.map_or(true, |(_, m)| acc.mean() > m) {
            best = Some((h, acc.mean()));
        }
    }
    best.map_or(0, |(h, _)| h)
}

pub(crate) fn build_insights(summary: &PerChannel<SummaryMetrics>, peak: (usize, usize)) -> Vec<KeyInsight> {
    let (a, b) = (&summary.tour_a, &summary.tour_b);

    let efficiency = drop_pct(a.avg_power, b.avg_power);
    let leaner = if efficiency > 0.0 { Channel::B } else { Channel::A };
    let weekend_a = drop_pct(a.weekday_avg, a.weekend_avg);
    let weekend_b = drop_pct(b.weekday_avg, b.weekend_avg);
    let monthly_mwh = (a.avg_power + b.avg_power) * 24.0 * 30.0 / 1000.0;

    vec![
        KeyInsight::new(
            "Energy Efficiency",
            format!("{:.1}%", efficiency.abs()),
            format!("{} uses {:.1}% less power on average", leaner.label(), efficiency.abs()),
        ),
        KeyInsight::new(
            "Peak Hour",
            format!("{}:00 / {}:00", peak.0, peak.1),
            format!("Tour A peaks at {}:00, Tour B at {}:00", peak.0, peak.1),
        ),
        KeyInsight::new(
            "Weekend Savings",
            format!("{:.0}%", (weekend_a + weekend_b) / 2.0),
            format!("Average weekend consumption drop (A: {weekend_a:.0}%, B: {weekend_b:.0}%)"),
        ),
        KeyInsight::new(
            "Monthly Usage",
            format!("~{monthly_mwh:.1} MWh"),
            "Combined monthly consumption estimate".to_string(),
        ),
        KeyInsight::new(
            "Load Factor",
            format!("{:.2} / {:.2}", a.load_factor, b.load_factor),
            "Load factor comparison (A / B). Higher is better.".to_string(),
        ),
        KeyInsight::new(
            "Data Coverage",
            format!("{:.0}% / {:.0}%", a.data_coverage * 100.0, b.data_coverage * 100.0),
            "Available data percentage for Tour A / Tour B".to_string(),
        ),
    ]
}

impl MetricsEngine {
    pub fn insights(&self, dataset: &Dataset, filter: &Filter) -> Vec<KeyInsight> {
        let view = View::new(dataset, filter);
        let summary = self.summary(dataset, filter);
        build_insights(&summary, (peak_hour(&view, Channel::A), peak_hour(&view, Channel::B)))
    }

    pub fn dashboard(&self, dataset: &Dataset, filter: &Filter) -> DashboardDocument {
        let summary = self.summary(dataset, filter);
        let view = View::new(dataset, filter);
        let key_insights =
            build_insights(&summary, (peak_hour(&view, Channel::A), peak_hour(&view, Channel::B)));
        DashboardDocument {
            generated_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            date_range: date_span(dataset),
            tour_summary: vec![summary.tour_a, summary.tour_b],
            hourly_data: self.hourly(dataset, filter),
            weekly_data: self.weekly(dataset, filter),
            time_series_data: self.timeseries(dataset, filter, Aggregation::Daily),
            monthly_data: self.monthly(dataset, filter),
            key_insights,
        }
    }
}
