use energy_client::Filter;
use serde::Serialize;

use super::{stats, MetricsEngine, View};
use crate::{config::CorrelationMethod, dataset::Dataset};

/// Paired metrics over the retained timestamps where both channels carry a
/// reading. Differences are `tour_b - tour_a`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonMetrics {
    pub paired_count: usize,
    pub correlation: f64,
    pub mean_tour_a: f64,
    pub mean_tour_b: f64,
    pub mean_difference: f64,
    pub mean_abs_difference: f64,
    /// Mean difference relative to Tour A's mean, in percent.
    pub pct_difference: f64,
    pub tour_a_higher: usize,
    pub tour_b_higher: usize,
    pub equal: usize,
}

pub fn compare(a: &[f64], b: &[f64], method: CorrelationMethod) -> ComparisonMetrics {
    let n = a.len().min(b.len());
    let (a, b) = (&a[..n], &b[..n]);
    if n == 0 {
        return ComparisonMetrics::default();
    }

    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| y - x).collect();
    let abs: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    let mean_a = stats::mean(a);
    let mean_diff = stats::mean(&diffs);

    ComparisonMetrics {
        paired_count: n,
        correlation: match method {
            CorrelationMethod::Pearson => stats::pearson(a, b),
        },
        mean_tour_a: mean_a,
        mean_tour_b: stats::mean(b),
        mean_difference: mean_diff,
        mean_abs_difference: stats::mean(&abs),
        pct_difference: stats::ratio(mean_diff, mean_a) * 100.0,
        tour_a_higher: diffs.iter().filter(|d| **d < 0.0).count(),
        tour_b_higher: diffs.iter().filter(|d| **d > 0.0).count(),
        equal: diffs.iter().filter(|d| **d == 0.0).count(),
    }
}

impl MetricsEngine {
    pub fn comparison(&self, dataset: &Dataset, filter: &Filter) -> ComparisonMetrics {
        let view = View::new(dataset, filter);
        let (a, b): (Vec<f64>, Vec<f64>) = view.paired().map(|(_, x, y)| (x, y)).unzip();
        compare(&a, &b, self.config().correlation)
    }
}
