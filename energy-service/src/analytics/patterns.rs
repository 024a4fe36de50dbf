use std::collections::BTreeMap;

use energy_client::{query::day_index, Channel, Filter, YearMonth};
use serde::Serialize;

use super::{MetricsEngine, View};
use crate::dataset::Dataset;

pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyEntry {
    pub hour: u8,
    pub tour_a: f64,
    pub tour_b: f64,
    /// `tour_b - tour_a`.
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyEntry {
    pub day: &'static str,
    pub day_index: u8,
    pub tour_a: f64,
    pub tour_b: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyEntry {
    /// `YYYY-MM`.
    pub month: String,
    pub month_name: String,
    pub tour_a: f64,
    pub tour_b: f64,
}

/// Running mean; an empty group reads as 0.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MeanAcc {
    sum: f64,
    count: usize,
}

impl MeanAcc {
    pub(crate) fn push(&mut self, v: f64) {
        self.sum += v;
        self.count += 1;
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    pub(crate) fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Per-hour-of-day means of one channel's retained readings.
pub(crate) fn hourly_means(view: &View<'_>, channel: Channel) -> [MeanAcc; 24] {
    let mut acc = [MeanAcc::default(); 24];
    for (ts, v) in view.readings(channel) {
        acc[ts.hour() as usize].push(v);
    }
    acc
}

fn weekly_means(view: &View<'_>, channel: Channel) -> [MeanAcc; 7] {
    let mut acc = [MeanAcc::default(); 7];
    for (ts, v) in view.readings(channel) {
        acc[day_index(ts.weekday()) as usize].push(v);
    }
    acc
}

impl MetricsEngine {
    /// Always 24 entries, hour 0 to 23.
    pub fn hourly(&self, dataset: &Dataset, filter: &Filter) -> Vec<HourlyEntry> {
        let view = View::new(dataset, filter);
        let a = hourly_means(&view, Channel::A);
        let b = hourly_means(&view, Channel::B);
        (0..24)
            .map(|h| {
                let (tour_a, tour_b) = (a[h].mean(), b[h].mean());
                HourlyEntry {
                    hour: h as u8,
                    tour_a,
                    tour_b,
                    difference: tour_b - tour_a,
                }
            })
            .collect()
    }

    /// Always 7 entries, Monday first.
    pub fn weekly(&self, dataset: &Dataset, filter: &Filter) -> Vec<WeeklyEntry> {
        let view = View::new(dataset, filter);
        let a = weekly_means(&view, Channel::A);
        let b = weekly_means(&view, Channel::B);
        DAY_NAMES
            .into_iter()
            .enumerate()
            .map(|(i, day)| WeeklyEntry {
                day,
                day_index: i as u8,
                tour_a: a[i].mean(),
                tour_b: b[i].mean(),
            })
            .collect()
    }

    /// One entry per calendar month touched by the retained grid slots.
    pub fn monthly(&self, dataset: &Dataset, filter: &Filter) -> Vec<MonthlyEntry> {
        let view = View::new(dataset, filter);
        let mut months: BTreeMap<YearMonth, (MeanAcc, MeanAcc)> = BTreeMap::new();
        for channel in Channel::ALL {
            for (ts, v) in view.points(channel) {
                let entry = months.entry(YearMonth::of(ts.date())).or_default();
                if let Some(v) = v {
                    match channel {
                        Channel::A => entry.0.push(v),
                        Channel::B => entry.1.push(v),
                    }
                }
            }
        }
        months
            .into_iter()
            .map(|(ym, (a, b))| MonthlyEntry {
                month: ym.to_string(),
                month_name: ym.short_name(),
                tour_a: a.mean(),
                tour_b: b.mean(),
            })
            .collect()
    }
}
