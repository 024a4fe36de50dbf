use energy_client::{domain::align_to_step, TimeGrid};
use time::{Date, Duration, Month, PrimitiveDateTime, Time};

use crate::{
    config::{CleaningConfig, EndOfDayPolicy},
    pipeline::{PipelineError, Transform},
    sources::{excel_serial_to_datetime, RawCell},
    transform::normalize::NormalizedTable,
};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Parses a calendar date from a cell.
///
/// Text accepts `dd-mm-yyyy`, `dd/mm/yyyy` and `yyyy-mm-dd`, optionally
/// followed by a time part which is ignored. Numbers are read as spreadsheet
/// serial dates.
pub fn parse_date(cell: &RawCell) -> Option<Date> {
    match cell {
        RawCell::DateTime(dt) => Some(dt.date()),
        RawCell::Number(serial) => excel_serial_to_datetime(*serial).map(|dt| dt.date()),
        RawCell::Text(s) => parse_date_text(s),
        RawCell::Empty => None,
    }
}

fn parse_date_text(s: &str) -> Option<Date> {
    let date_part = s.trim().split([' ', 'T']).next()?;
    let parts: Vec<&str> = date_part.split(['-', '/', '.']).collect();
    let [a, b, c] = parts.as_slice() else {
        return None;
    };
    let (year, month, day) = if a.len() == 4 { (a, b, c) } else { (c, b, a) };
    let year: i32 = year.parse().ok()?;
    let month: u8 = month.parse().ok()?;
    let day: u8 = day.parse().ok()?;
    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    At(Time),
    /// The `24:00:00` sentinel some exports use for the end of a day.
    EndOfDay,
}

/// Parses a time of day from a cell: `HH:MM[:SS]` text, a datetime cell, or
/// a spreadsheet day fraction.
pub fn parse_time(cell: &RawCell) -> Option<TimeOfDay> {
    match cell {
        RawCell::DateTime(dt) => Some(TimeOfDay::At(dt.time())),
        RawCell::Number(fraction) => {
            if !fraction.is_finite() || *fraction < 0.0 {
                return None;
            }
            let secs = (fraction.fract() * SECONDS_PER_DAY).round() as u32;
            if secs >= 86_400 {
                return Some(TimeOfDay::EndOfDay);
            }
            Time::from_hms((secs / 3600) as u8, ((secs / 60) % 60) as u8, (secs % 60) as u8)
                .ok()
                .map(TimeOfDay::At)
        }
        RawCell::Text(s) => parse_time_text(s),
        RawCell::Empty => None,
    }
}

fn parse_time_text(s: &str) -> Option<TimeOfDay> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    let (h, m, sec) = match parts.as_slice() {
        [h, m] => (*h, *m, "0"),
        [h, m, s] => (*h, *m, *s),
        _ => return None,
    };
    let hour: u8 = h.trim().parse().ok()?;
    let minute: u8 = m.trim().parse().ok()?;
    // fractional seconds are truncated
    let second: u8 = sec.trim().split('.').next()?.parse().ok()?;
    if hour == 24 && minute == 0 && second == 0 {
        return Some(TimeOfDay::EndOfDay);
    }
    Time::from_hms(hour, minute, second).ok().map(TimeOfDay::At)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTimestamp {
    Valid(PrimitiveDateTime),
    EndOfDay,
    Invalid,
}

/// Combines a date and a time cell into one timestamp.
pub fn row_timestamp(date: &RawCell, time: &RawCell, policy: EndOfDayPolicy) -> RowTimestamp {
    let (Some(d), Some(t)) = (parse_date(date), parse_time(time)) else {
        return RowTimestamp::Invalid;
    };
    match (t, policy) {
        (TimeOfDay::At(t), _) => RowTimestamp::Valid(PrimitiveDateTime::new(d, t)),
        (TimeOfDay::EndOfDay, EndOfDayPolicy::Drop) => RowTimestamp::EndOfDay,
        (TimeOfDay::EndOfDay, EndOfDayPolicy::RollOver) => match d.next_day() {
            Some(next) => RowTimestamp::Valid(next.midnight()),
            None => RowTimestamp::Invalid,
        },
    }
}

/// Row accounting for one cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningStats {
    pub rows_in: usize,
    pub end_of_day_dropped: usize,
    pub unparseable_dropped: usize,
    pub duplicates_dropped: usize,
    pub realigned: usize,
}

/// Both channels on one shared grid; values not yet sanitized.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTable {
    pub grid: TimeGrid,
    pub tour_a: Vec<Option<f64>>,
    pub tour_b: Vec<Option<f64>>,
    pub stats: CleaningStats,
}

/// Merges normalized tables (in file order) onto a fixed-step grid.
///
/// Timestamps are floored to the step, sorted stably and deduplicated keeping
/// the first occurrence, so an earlier file wins over a later one.
#[derive(Debug, Clone)]
pub struct TemporalCleaner {
    step: Duration,
    end_of_day: EndOfDayPolicy,
}

impl TemporalCleaner {
    pub fn new(cfg: &CleaningConfig) -> Self {
        Self {
            step: Duration::minutes(cfg.interval_minutes),
            end_of_day: cfg.end_of_day_policy,
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn clean(&self, tables: Vec<NormalizedTable>) -> CleanedTable {
        let mut stats = CleaningStats::default();
        let mut rows: Vec<(PrimitiveDateTime, Option<f64>, Option<f64>)> = Vec::new();

        for table in tables {
            let mut dropped = 0usize;
            for row in table.rows {
                stats.rows_in += 1;
                match row_timestamp(&row.date, &row.time, self.end_of_day) {
                    RowTimestamp::Valid(ts) => {
                        let aligned = align_to_step(ts, self.step);
                        if aligned != ts {
                            stats.realigned += 1;
                        }
                        rows.push((aligned, row.tour_a, row.tour_b));
                    }
                    RowTimestamp::EndOfDay => {
                        stats.end_of_day_dropped += 1;
                        dropped += 1;
                    }
                    RowTimestamp::Invalid => {
                        stats.unparseable_dropped += 1;
                        dropped += 1;
                    }
                }
            }
            if dropped > 0 {
                tracing::debug!(path = %table.origin.display(), dropped, "rows without a usable timestamp");
            }
        }

        rows.sort_by_key(|r| r.0);
        let before = rows.len();
        rows.dedup_by_key(|r| r.0);
        stats.duplicates_dropped = before - rows.len();

        let grid = match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => TimeGrid::spanning(first.0, last.0, self.step),
            _ => TimeGrid::empty(self.step),
        };

        let mut tour_a = vec![None; grid.len()];
        let mut tour_b = vec![None; grid.len()];
        for (ts, a, b) in rows {
            if let Some(i) = grid.index_of(ts) {
                tour_a[i] = a;
                tour_b[i] = b;
            }
        }

        CleanedTable {
            grid,
            tour_a,
            tour_b,
            stats,
        }
    }
}

impl Transform<Vec<NormalizedTable>, CleanedTable> for TemporalCleaner {
    fn apply(&self, input: Vec<NormalizedTable>) -> Result<CleanedTable, PipelineError> {
        let cleaned = self.clean(input);
        let s = &cleaned.stats;
        metrics::counter!("ingest_rows_dropped_total", "reason" => "end_of_day")
            .increment(s.end_of_day_dropped as u64);
        metrics::counter!("ingest_rows_dropped_total", "reason" => "unparseable")
            .increment(s.unparseable_dropped as u64);
        metrics::counter!("ingest_rows_dropped_total", "reason" => "duplicate")
            .increment(s.duplicates_dropped as u64);

        let has_value = cleaned
            .tour_a
            .iter()
            .chain(cleaned.tour_b.iter())
            .any(Option::is_some);
        if !has_value {
            return Err(PipelineError::NoData(std::path::PathBuf::new()));
        }
        Ok(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sources::SourceFormat, transform::normalize::NormalizedRow};
    use time::macros::{date, datetime, time};

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    fn row(d: &str, t: &str, a: Option<f64>, b: Option<f64>) -> NormalizedRow {
        NormalizedRow {
            date: text(d),
            time: text(t),
            tour_a: a,
            tour_b: b,
        }
    }

    fn table(name: &str, rows: Vec<NormalizedRow>) -> NormalizedTable {
        NormalizedTable {
            origin: name.into(),
            format: SourceFormat::Csv,
            tour_a_column: Some("a".into()),
            tour_b_column: Some("b".into()),
            rows,
        }
    }

    #[test]
    fn parses_the_date_layouts_seen_in_exports() {
        assert_eq!(parse_date(&text("01-03-2025")), Some(date!(2025 - 03 - 01)));
        assert_eq!(parse_date(&text("2025-03-01")), Some(date!(2025 - 03 - 01)));
        assert_eq!(parse_date(&text("1/3/2025")), Some(date!(2025 - 03 - 01)));
        assert_eq!(parse_date(&text("2025-03-01 00:00:00")), Some(date!(2025 - 03 - 01)));
        assert_eq!(parse_date(&RawCell::Number(45717.0)), Some(date!(2025 - 03 - 01)));
        assert_eq!(parse_date(&text("31-02-2025")), None);
        assert_eq!(parse_date(&text("garbage")), None);
    }

    #[test]
    fn parses_times_and_the_end_of_day_sentinel() {
        assert_eq!(parse_time(&text("00:15:00")), Some(TimeOfDay::At(time!(0:15))));
        assert_eq!(parse_time(&text("7:45")), Some(TimeOfDay::At(time!(7:45))));
        assert_eq!(parse_time(&text("24:00:00")), Some(TimeOfDay::EndOfDay));
        assert_eq!(parse_time(&RawCell::Number(0.5)), Some(TimeOfDay::At(time!(12:00))));
        assert_eq!(parse_time(&text("25:00:00")), None);
    }

    #[test]
    fn end_of_day_rows_are_dropped_by_default() {
        let cleaner = TemporalCleaner::new(&CleaningConfig::default());
        let out = cleaner.clean(vec![table(
            "f.csv",
            vec![
                row("01-01-2025", "23:45:00", Some(1.0), None),
                row("01-01-2025", "24:00:00", Some(9.0), None),
            ],
        )]);
        assert_eq!(out.stats.end_of_day_dropped, 1);
        assert_eq!(out.grid.len(), 1);
        assert_eq!(out.grid.start(), datetime!(2025-01-01 23:45));
    }

    #[test]
    fn roll_over_policy_moves_sentinel_to_next_midnight() {
        let cfg = CleaningConfig {
            end_of_day_policy: EndOfDayPolicy::RollOver,
            ..CleaningConfig::default()
        };
        let out = TemporalCleaner::new(&cfg).clean(vec![table(
            "f.csv",
            vec![
                row("01-01-2025", "23:45:00", Some(1.0), None),
                row("01-01-2025", "24:00:00", Some(2.0), None),
            ],
        )]);
        assert_eq!(out.grid.len(), 2);
        assert_eq!(out.grid.end(), Some(datetime!(2025-01-02 00:00)));
        assert_eq!(out.tour_a, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn duplicates_keep_the_first_file_and_gaps_become_missing() {
        let cleaner = TemporalCleaner::new(&CleaningConfig::default());
        let out = cleaner.clean(vec![
            table(
                "a.csv",
                vec![
                    row("01-01-2025", "00:00:00", Some(1.0), Some(2.0)),
                    row("01-01-2025", "00:45:00", Some(4.0), Some(2.0)),
                ],
            ),
            table("b.csv", vec![row("01-01-2025", "00:00:00", Some(99.0), Some(99.0))]),
        ]);
        assert_eq!(out.stats.duplicates_dropped, 1);
        assert_eq!(out.grid.len(), 4);
        assert_eq!(out.tour_a, vec![Some(1.0), None, None, Some(4.0)]);
        assert_eq!(out.tour_b, vec![Some(2.0), None, None, Some(2.0)]);
    }

    #[test]
    fn off_grid_timestamps_are_floored() {
        let cleaner = TemporalCleaner::new(&CleaningConfig::default());
        let out = cleaner.clean(vec![table(
            "f.csv",
            vec![
                row("01-01-2025", "00:00:00", Some(1.0), None),
                row("01-01-2025", "00:17:30", Some(2.0), None),
            ],
        )]);
        assert_eq!(out.stats.realigned, 1);
        assert_eq!(out.grid.timestamp(1), datetime!(2025-01-01 00:15));
    }

    #[test]
    fn no_values_at_all_is_no_data() {
        let cleaner = TemporalCleaner::new(&CleaningConfig::default());
        let err = cleaner
            .apply(vec![table("f.csv", vec![row("bad", "00:00:00", Some(1.0), None)])])
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoData(_)));
    }
}
