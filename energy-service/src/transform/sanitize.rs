use energy_client::{Channel, ChannelSeries, QualityReport, Slot, SlotFlag, TimeGrid};

use crate::{
    config::CleaningConfig,
    pipeline::{PipelineError, Transform},
    transform::temporal::{CleanedTable, CleaningStats},
};

/// Upper bound for plausible readings of a channel.
///
/// With `sigma` set the bound tightens to `mean + sigma * std` over the finite
/// raw values (sample standard deviation), never above `max_power_kw`.
pub fn ceiling(values: &[Option<f64>], max_power_kw: f64, sigma: Option<f64>) -> f64 {
    let Some(sigma) = sigma else {
        return max_power_kw;
    };
    let finite: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < 2 {
        return max_power_kw;
    }
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean + sigma * var.sqrt()).min(max_power_kw)
}

/// Linear fill of interior runs of missing slots no longer than `limit`.
///
/// Only slots flagged `Missing` are filled; rejected readings stay rejected.
/// Runs touching either end of the series are left alone.
pub fn interpolate_gaps(slots: &[Slot], limit: usize) -> Vec<Slot> {
    let mut out = slots.to_vec();
    let mut i = 0;
    while i < out.len() {
        if out[i].flag != SlotFlag::Missing {
            i += 1;
            continue;
        }
        let start = i;
        while i < out.len() && out[i].flag == SlotFlag::Missing {
            i += 1;
        }
        let run = i - start;
        let before = start.checked_sub(1).and_then(|b| out[b].value);
        let after = out.get(i).and_then(|s| s.value);
        if let (Some(lo), Some(hi)) = (before, after) {
            if run <= limit {
                let span = (run + 1) as f64;
                for (k, slot) in out[start..i].iter_mut().enumerate() {
                    let frac = (k + 1) as f64 / span;
                    *slot = Slot::interpolated(lo + (hi - lo) * frac);
                }
            }
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedPair {
    pub tour_a: ChannelSeries,
    pub tour_b: ChannelSeries,
    pub stats: CleaningStats,
}

impl SanitizedPair {
    pub fn quality(&self, channel: Channel) -> QualityReport {
        let series = match channel {
            Channel::A => &self.tour_a,
            Channel::B => &self.tour_b,
        };
        QualityReport::from_slots(series.slots())
    }
}

/// Rejects impossible readings and optionally fills short gaps.
#[derive(Debug, Clone)]
pub struct ValueSanitizer {
    max_power_kw: f64,
    outlier_sigma: Option<f64>,
    interpolate_limit: Option<usize>,
}

impl ValueSanitizer {
    pub fn new(cfg: &CleaningConfig) -> Self {
        Self {
            max_power_kw: cfg.max_power_kw,
            outlier_sigma: cfg.outlier_sigma,
            interpolate_limit: cfg.interpolate_limit,
        }
    }

    pub fn sanitize_channel(
        &self,
        channel: Channel,
        grid: TimeGrid,
        raw: &[Option<f64>],
    ) -> Result<ChannelSeries, PipelineError> {
        let ceiling = ceiling(raw, self.max_power_kw, self.outlier_sigma);
        let mut rejected = 0u64;
        let slots: Vec<Slot> = raw
            .iter()
            .map(|v| match *v {
                None => Slot::missing(),
                Some(v) if !v.is_finite() || v < 0.0 || v > ceiling => {
                    rejected += 1;
                    Slot::rejected()
                }
                Some(v) => Slot::measured(v),
            })
            .collect();

        if rejected > 0 {
            tracing::info!(channel = %channel, rejected, ceiling, "readings rejected as implausible");
            metrics::counter!("sanitize_rejected_total", "channel" => channel.key()).increment(rejected);
        }

        let slots = match self.interpolate_limit {
            Some(limit) if limit > 0 => interpolate_gaps(&slots, limit),
            _ => slots,
        };
        Ok(ChannelSeries::new(channel, grid, slots)?)
    }
}

impl Transform<CleanedTable, SanitizedPair> for ValueSanitizer {
    fn apply(&self, input: CleanedTable) -> Result<SanitizedPair, PipelineError> {
        let tour_a = self.sanitize_channel(Channel::A, input.grid, &input.tour_a)?;
        let tour_b = self.sanitize_channel(Channel::B, input.grid, &input.tour_b)?;
        Ok(SanitizedPair {
            tour_a,
            tour_b,
            stats: input.stats,
        })
    }
}
