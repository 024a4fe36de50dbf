use energy_client::Filter;
use serde::Serialize;

use super::{stats, MetricsEngine, PerChannel, View};
use crate::dataset::Dataset;

/// Largest bin count a histogram is built with.
pub const MAX_BINS: usize = 1_000;

/// Bin over `[start, end)`; the last bin of a histogram also holds `end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentileValue {
    pub percentile: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionMetrics {
    pub histogram: Vec<HistogramBin>,
    pub percentiles: Vec<PercentileValue>,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub std: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub min: f64,
    pub max: f64,
}

/// Equal-width histogram over `[min, max]` of `values`.
///
/// A single distinct value is widened to `[v - 0.5, v + 0.5]`. No values
/// means no bins. `bins` is clamped to `1..=MAX_BINS`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() {
        return Vec::new();
    }
    let bins = bins.clamp(1, MAX_BINS);
    let (mut lo, mut hi) = (stats::min(values), stats::max(values));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = ((v - lo) / width).floor() as usize;
        counts[idx.min(bins - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: lo + width * i as f64,
            end: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

fn describe(values: &[f64], bins: usize, ladder: &[f64]) -> DistributionMetrics {
    let sorted = stats::sorted(values);
    DistributionMetrics {
        histogram: histogram(values, bins),
        percentiles: ladder
            .iter()
            .map(|&p| PercentileValue {
                percentile: p,
                value: stats::percentile(&sorted, p),
            })
            .collect(),
        count: values.len(),
        mean: stats::mean(values),
        median: stats::median(&sorted),
        mode: stats::mode(&sorted),
        std: stats::std_dev(values),
        skewness: stats::skewness(values),
        kurtosis: stats::kurtosis(values),
        min: stats::min(values),
        max: stats::max(values),
    }
}

impl MetricsEngine {
    /// `bins` falls back to the configured default and is capped at [`MAX_BINS`].
    pub fn distribution(
        &self,
        dataset: &Dataset,
        filter: &Filter,
        bins: Option<usize>,
    ) -> PerChannel<DistributionMetrics> {
        let view = View::new(dataset, filter);
        let bins = bins.unwrap_or(self.config().default_bins);
        PerChannel::from_fn(|c| describe(&view.values(c), bins, &self.config().percentiles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::tests::dataset_from;
    use time::macros::datetime;

    #[test]
    fn counts_sum_to_value_count() {
        let values = [0.0, 0.1, 0.5, 0.99, 1.0, 2.5, 3.7, 4.0, 4.0];
        for bins in [1, 3, 7, 20] {
            let h = histogram(&values, bins);
            assert_eq!(h.len(), bins);
            assert_eq!(h.iter().map(|b| b.count).sum::<usize>(), values.len());
        }
    }

    #[test]
    fn last_bin_is_closed() {
        let h = histogram(&[0.0, 1.0, 2.0], 2);
        assert_eq!(h[0].count, 1);
        assert_eq!(h[1].count, 2);
        assert_eq!(h[1].end, 2.0);
    }

    #[test]
    fn constant_values_get_a_unit_range() {
        let h = histogram(&[3.0, 3.0], 4);
        assert_eq!(h[0].start, 2.5);
        assert_eq!(h[3].end, 3.5);
        assert_eq!(h.iter().map(|b| b.count).sum::<usize>(), 2);
    }

    #[test]
    fn oversized_bin_count_is_capped() {
        let h = histogram(&[0.0, 1.0, 2.0], usize::MAX);
        assert_eq!(h.len(), MAX_BINS);
        assert_eq!(h.iter().map(|b| b.count).sum::<usize>(), 3);

        let ds = dataset_from(datetime!(2025-01-01 00:00), &[Some(1.0), Some(2.0)], &[Some(1.0), None]);
        let d = MetricsEngine::default().distribution(&ds, &Filter::all(), Some(1 << 40));
        assert_eq!(d.tour_a.histogram.len(), MAX_BINS);
    }

    #[test]
    fn empty_channel_has_no_bins_and_zero_stats() {
        let ds = dataset_from(datetime!(2025-01-01 00:00), &[Some(1.0), Some(2.0)], &[None, None]);
        let d = MetricsEngine::default().distribution(&ds, &Filter::all(), Some(5));
        assert!(d.tour_b.histogram.is_empty());
        assert_eq!(d.tour_b.mean, 0.0);
        assert_eq!(d.tour_b.percentiles.len(), 8);
        assert_eq!(d.tour_a.count, 2);
        assert_eq!(d.tour_a.histogram.len(), 5);
    }
}
