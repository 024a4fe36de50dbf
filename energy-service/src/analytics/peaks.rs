use std::collections::BTreeMap;

use energy_client::{Channel, Filter};
use serde::Serialize;
use time::Date;

use super::{patterns::hourly_means, MetricsEngine, PerChannel, View};
use crate::dataset::Dataset;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyMean {
    pub hour: u8,
    pub avg_power: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPeak {
    pub date: String,
    pub max_power: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakRanking {
    pub peak_hours: Vec<HourlyMean>,
    pub off_peak_hours: Vec<HourlyMean>,
    pub daily_peaks: Vec<DailyPeak>,
}

/// Ranks the hours that have readings. Ties go to the earlier hour in both
/// directions.
pub fn rank_hours(means: &[HourlyMean], top_n: usize) -> (Vec<HourlyMean>, Vec<HourlyMean>) {
    let mut desc = means.to_vec();
    desc.sort_by(|x, y| y.avg_power.total_cmp(&x.avg_power).then(x.hour.cmp(&y.hour)));
    let mut asc = means.to_vec();
    asc.sort_by(|x, y| x.avg_power.total_cmp(&y.avg_power).then(x.hour.cmp(&y.hour)));
    desc.truncate(top_n);
    asc.truncate(top_n);
    (desc, asc)
}

fn ranking(view: &View<'_>, channel: Channel, top_n: usize) -> PeakRanking {
    let means: Vec<HourlyMean> = hourly_means(view, channel)
        .iter()
        .enumerate()
        .filter(|(_, acc)| acc.count() > 0)
        .map(|(h, acc)| HourlyMean {
            hour: h as u8,
            avg_power: acc.mean(),
        })
        .collect();
    let (peak_hours, off_peak_hours) = rank_hours(&means, top_n);

    let mut daily: BTreeMap<Date, f64> = BTreeMap::new();
    for (ts, v) in view.readings(channel) {
        daily
            .entry(ts.date())
            .and_modify(|m| *m = m.max(v))
            .or_insert(v);
    }

    PeakRanking {
        peak_hours,
        off_peak_hours,
        daily_peaks: daily
            .into_iter()
            .map(|(date, max_power)| DailyPeak {
                date: date.to_string(),
                max_power,
            })
            .collect(),
    }
}

impl MetricsEngine {
    /// `top_n` falls back to the configured default and is capped at 24.
    pub fn peak_analysis(
        &self,
        dataset: &Dataset,
        filter: &Filter,
        top_n: Option<usize>,
    ) -> PerChannel<PeakRanking> {
        let view = View::new(dataset, filter);
        let top_n = top_n.unwrap_or(self.config().default_top_n).min(24);
        PerChannel::from_fn(|c| ranking(&view, c, top_n))
    }
}
