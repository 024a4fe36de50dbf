use std::path::PathBuf;

use energy_client::Channel;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::{ChannelMatcherConfig, ChannelsConfig, DataConfig},
    pipeline::{Envelope, PipelineError, Transform},
    sources::{RawCell, RawTable, SourceFormat},
};

/// Trailing ` 12`, ` [kW]` (in any order, any number of times).
static TRAILING_ANNOTATIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\s*\[[^\]]*\]|\s*\d+)+\s*$").expect("static regex"));

/// Header label as used for matching.
///
/// Workbook exports append a numeric suffix and a bracketed unit to every
/// label; those are stripped. Text exports are taken verbatim.
pub fn canonical_label(raw: &str, format: SourceFormat) -> String {
    let trimmed = raw.trim();
    match format {
        SourceFormat::Csv => trimmed.to_string(),
        SourceFormat::Spreadsheet => TRAILING_ANNOTATIONS.replace(trimmed, "").trim().to_string(),
    }
}

/// Case-insensitive substring rules identifying one building's power column.
#[derive(Debug, Clone)]
pub struct ChannelMatcher {
    tokens: Vec<String>,
    required: Vec<String>,
    excluded: Vec<String>,
}

impl ChannelMatcher {
    pub fn from_config(cfg: &ChannelMatcherConfig) -> Self {
        let lower = |v: &[String]| v.iter().map(|s| s.to_lowercase()).collect::<Vec<_>>();
        Self {
            tokens: lower(&cfg.tokens),
            required: lower(&cfg.required),
            excluded: lower(&cfg.excluded),
        }
    }

    pub fn matches(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.tokens.iter().any(|t| label.contains(t.as_str()))
            && self.required.iter().all(|r| label.contains(r.as_str()))
            && !self.excluded.iter().any(|x| label.contains(x.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub date: RawCell,
    pub time: RawCell,
    pub tour_a: Option<f64>,
    pub tour_b: Option<f64>,
}

/// A file reduced to timestamp parts plus the two canonical power channels.
///
/// A channel whose column was not found is `None` on every row.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub origin: PathBuf,
    pub format: SourceFormat,
    pub tour_a_column: Option<String>,
    pub tour_b_column: Option<String>,
    pub rows: Vec<NormalizedRow>,
}

#[derive(Debug, Clone)]
pub struct ColumnNormalizer {
    date_column: String,
    time_column: String,
    tour_a: ChannelMatcher,
    tour_b: ChannelMatcher,
}

impl ColumnNormalizer {
    pub fn new(data: &DataConfig, channels: &ChannelsConfig) -> Self {
        Self {
            date_column: data.date_column.clone(),
            time_column: data.time_column.clone(),
            tour_a: ChannelMatcher::from_config(&channels.tour_a),
            tour_b: ChannelMatcher::from_config(&channels.tour_b),
        }
    }

    pub fn normalize(&self, env: Envelope<RawTable>) -> Result<NormalizedTable, PipelineError> {
        let Envelope { payload: table, origin } = env;
        let labels: Vec<String> = table
            .headers
            .iter()
            .map(|h| canonical_label(h, table.format))
            .collect();

        let find = |name: &str| labels.iter().position(|l| l.eq_ignore_ascii_case(name));
        let date_idx = find(&self.date_column).ok_or_else(|| PipelineError::MissingColumn {
            path: origin.clone(),
            column: self.date_column.clone(),
        })?;
        let time_idx = find(&self.time_column).ok_or_else(|| PipelineError::MissingColumn {
            path: origin.clone(),
            column: self.time_column.clone(),
        })?;

        let a_idx = labels.iter().position(|l| self.tour_a.matches(l));
        let b_idx = labels.iter().position(|l| self.tour_b.matches(l));
        for (channel, idx) in [(Channel::A, a_idx), (Channel::B, b_idx)] {
            if idx.is_none() {
                tracing::warn!(
                    path = %origin.display(),
                    channel = %channel,
                    "no power column found; channel is missing for this file"
                );
            }
        }

        let cell = |row: &[RawCell], idx: usize| row.get(idx).cloned().unwrap_or(RawCell::Empty);
        let power = |row: &[RawCell], idx: Option<usize>| {
            idx.and_then(|i| row.get(i)).and_then(RawCell::as_f64)
        };

        let rows = table
            .rows
            .iter()
            .map(|row| NormalizedRow {
                date: cell(row, date_idx),
                time: cell(row, time_idx),
                tour_a: power(row, a_idx),
                tour_b: power(row, b_idx),
            })
            .collect();

        Ok(NormalizedTable {
            tour_a_column: a_idx.map(|i| table.headers[i].clone()),
            tour_b_column: b_idx.map(|i| table.headers[i].clone()),
            origin,
            format: table.format,
            rows,
        })
    }
}

impl Transform<Envelope<RawTable>, NormalizedTable> for ColumnNormalizer {
    fn apply(&self, input: Envelope<RawTable>) -> Result<NormalizedTable, PipelineError> {
        self.normalize(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> ColumnNormalizer {
        ColumnNormalizer::new(&DataConfig::default(), &ChannelsConfig::default())
    }

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    #[test]
    fn spreadsheet_labels_lose_suffix_and_unit() {
        assert_eq!(
            canonical_label("TOUR_A_(TGBT_D14) kW sys avg 12", SourceFormat::Spreadsheet),
            "TOUR_A_(TGBT_D14) kW sys avg"
        );
        assert_eq!(
            canonical_label("Tour_B_(TGBT_D5) kW sys avg [kW] 3", SourceFormat::Spreadsheet),
            "Tour_B_(TGBT_D5) kW sys avg"
        );
        assert_eq!(canonical_label(" Date ", SourceFormat::Spreadsheet), "Date");
        // text exports keep their labels as-is
        assert_eq!(canonical_label("Meter 2", SourceFormat::Csv), "Meter 2");
    }

    #[test]
    fn matcher_requires_token_and_power_kind() {
        let m = ChannelMatcher::from_config(&ChannelsConfig::default().tour_a);
        assert!(m.matches("TOUR_A_(TGBT_D14) kW sys avg"));
        assert!(m.matches("tour_a_(tgbt_d14) KW SYS AVG"));
        assert!(!m.matches("TOUR_A_(TGBT_D14) kVAr sys avg"));
        assert!(!m.matches("TOUR_A_(TGBT_D14) kW sys max"));
        assert!(!m.matches("CLIM_TOUR_A_(TGBT_D6) kW sys avg"));
    }

    #[test]
    fn maps_columns_onto_channels() {
        let table = RawTable {
            format: SourceFormat::Spreadsheet,
            headers: vec![
                "Date".into(),
                "Time".into(),
                "Tour_B_(TGBT_D5) kW sys avg 7".into(),
                "TOUR_A_(TGBT_D14) kW sys avg 4".into(),
            ],
            rows: vec![vec![text("01-01-2025"), text("00:00:00"), RawCell::Number(2.0), text("1.5")]],
        };
        let out = normalizer().normalize(Envelope::new(table, "x.xlsx")).unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].tour_a, Some(1.5));
        assert_eq!(out.rows[0].tour_b, Some(2.0));
        assert_eq!(out.tour_a_column.as_deref(), Some("TOUR_A_(TGBT_D14) kW sys avg 4"));
    }

    #[test]
    fn absent_channel_is_all_missing_not_an_error() {
        let table = RawTable {
            format: SourceFormat::Csv,
            headers: vec!["Date".into(), "Time".into(), "TOUR_A_(TGBT_D14) kW sys avg".into()],
            rows: vec![vec![text("01-01-2025"), text("00:00:00"), text("3")]],
        };
        let out = normalizer().normalize(Envelope::new(table, "x.csv")).unwrap();
        assert_eq!(out.rows[0].tour_a, Some(3.0));
        assert_eq!(out.rows[0].tour_b, None);
        assert!(out.tour_b_column.is_none());
    }

    #[test]
    fn missing_time_column_rejects_the_file() {
        let table = RawTable {
            format: SourceFormat::Csv,
            headers: vec!["Date".into(), "Value".into()],
            rows: vec![],
        };
        let err = normalizer().apply(Envelope::new(table, "x.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { column, .. } if column == "Time"));
    }
}
