use std::{collections::BTreeMap, str::FromStr};

use energy_client::{Channel, Filter};
use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description, Date, PrimitiveDateTime};

use super::{patterns::MeanAcc, MetricsEngine, View, TIMESTAMP_FORMAT};
use crate::dataset::Dataset;

const DAY_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const MONTH_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Raw,
    Hourly,
    #[default]
    Daily,
    Monthly,
}

impl Aggregation {
    fn bucket(self, ts: PrimitiveDateTime) -> PrimitiveDateTime {
        match self {
            Aggregation::Raw => ts,
            Aggregation::Hourly => ts.date().with_hms(ts.hour(), 0, 0).unwrap_or(ts),
            Aggregation::Daily => ts.date().midnight(),
            Aggregation::Monthly => Date::from_calendar_date(ts.year(), ts.month(), 1)
                .map(Date::midnight)
                .unwrap_or(ts),
        }
    }

    fn label(self, bucket: PrimitiveDateTime) -> String {
        let format = match self {
            Aggregation::Raw | Aggregation::Hourly => TIMESTAMP_FORMAT,
            Aggregation::Daily => DAY_FORMAT,
            Aggregation::Monthly => MONTH_FORMAT,
        };
        bucket.format(format).unwrap_or_else(|_| bucket.to_string())
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Aggregation::Raw),
            "hourly" => Ok(Aggregation::Hourly),
            "daily" => Ok(Aggregation::Daily),
            "monthly" => Ok(Aggregation::Monthly),
            other => Err(format!("unknown aggregation '{other}', expected raw|hourly|daily|monthly")),
        }
    }
}

/// One bucket of the chart series. A channel with no reading in the bucket
/// is `null`, so gaps stay visible.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesPoint {
    pub timestamp: String,
    pub tour_a: Option<f64>,
    pub tour_b: Option<f64>,
}

impl MetricsEngine {
    pub fn timeseries(
        &self,
        dataset: &Dataset,
        filter: &Filter,
        aggregation: Aggregation,
    ) -> Vec<TimeseriesPoint> {
        let view = View::new(dataset, filter);

        if aggregation == Aggregation::Raw {
            return view
                .points(Channel::A)
                .zip(view.points(Channel::B))
                .map(|((ts, a), (_, b))| TimeseriesPoint {
                    timestamp: aggregation.label(ts),
                    tour_a: a,
                    tour_b: b,
                })
                .collect();
        }

        let mut buckets: BTreeMap<PrimitiveDateTime, (MeanAcc, MeanAcc)> = BTreeMap::new();
        for ((ts, a), (_, b)) in view.points(Channel::A).zip(view.points(Channel::B)) {
            let entry = buckets.entry(aggregation.bucket(ts)).or_default();
            if let Some(a) = a {
                entry.0.push(a);
            }
            if let Some(b) = b {
                entry.1.push(b);
            }
        }

        let mean = |acc: MeanAcc| (acc.count() > 0).then(|| acc.mean());
        buckets
            .into_iter()
            .map(|(bucket, (a, b))| TimeseriesPoint {
                timestamp: aggregation.label(bucket),
                tour_a: mean(a),
                tour_b: mean(b),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::tests::dataset_from;
    use time::macros::datetime;

    #[test]
    fn raw_keeps_every_retained_slot() {
        let ds = dataset_from(datetime!(2025-01-01 00:00), &[Some(1.0), None], &[Some(2.0), Some(3.0)]);
        let points = MetricsEngine::default().timeseries(&ds, &Filter::all(), Aggregation::Raw);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp, "2025-01-01 00:00:00");
        assert_eq!(points[1].tour_a, None);
        assert_eq!(points[1].tour_b, Some(3.0));
    }

    #[test]
    fn daily_buckets_average_present_values() {
        let a: Vec<Option<f64>> = (0..100).map(|i| if i < 96 { Some(2.0) } else { None }).collect();
        let b = vec![Some(1.0); 100];
        let ds = dataset_from(datetime!(2025-01-01 00:00), &a, &b);
        let points = MetricsEngine::default().timeseries(&ds, &Filter::all(), Aggregation::Daily);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp, "2025-01-01");
        assert_eq!(points[0].tour_a, Some(2.0));
        assert_eq!(points[1].tour_a, None);
        assert_eq!(points[1].tour_b, Some(1.0));
    }

    #[test]
    fn hourly_and_monthly_labels() {
        let ds = dataset_from(datetime!(2025-01-01 10:30), &[Some(1.0), Some(3.0)], &[None, None]);
        let hourly = MetricsEngine::default().timeseries(&ds, &Filter::all(), Aggregation::Hourly);
        assert_eq!(hourly.len(), 1);
        assert_eq!(hourly[0].timestamp, "2025-01-01 10:00:00");
        assert_eq!(hourly[0].tour_a, Some(2.0));
        let monthly = MetricsEngine::default().timeseries(&ds, &Filter::all(), Aggregation::Monthly);
        assert_eq!(monthly[0].timestamp, "2025-01");
    }

    #[test]
    fn parses_aggregation_names() {
        assert_eq!("HOURLY".parse::<Aggregation>(), Ok(Aggregation::Hourly));
        assert!("weekly".parse::<Aggregation>().is_err());
    }
}
