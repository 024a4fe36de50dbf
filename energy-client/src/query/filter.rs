use std::{collections::BTreeSet, fmt, str::FromStr};

use time::{macros::format_description, Date, Month, PrimitiveDateTime, Weekday};

use crate::domain::TimeGrid;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid day of week '{0}', expected 0 (Monday) to 6 (Sunday)")]
    InvalidDay(String),
    #[error("date range starts after it ends ({start} > {end})")]
    InvertedRange { start: Date, end: Date },
}

/// Monday = 0 .. Sunday = 6.
pub fn day_index(weekday: Weekday) -> u8 {
    weekday.number_days_from_monday()
}

/// A calendar month, encoded as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u8,
}

impl YearMonth {
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month() as u8,
        }
    }

    pub fn contains(&self, date: Date) -> bool {
        date.year() == self.year && date.month() as u8 == self.month
    }

    /// `Jan 2025` style label.
    pub fn short_name(&self) -> String {
        let name = Month::try_from(self.month)
            .map(|m| {
                let full = m.to_string();
                full[..3].to_string()
            })
            .unwrap_or_default();
        format!("{name} {}", self.year)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FilterError::InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        Month::try_from(month).map_err(|_| invalid())?;
        Ok(Self { year, month })
    }
}

/// Inclusive calendar-date bounds; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

impl DateRange {
    pub fn contains(&self, date: Date) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

fn parse_date(s: &str) -> Result<Date, FilterError> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| FilterError::InvalidDate(s.to_string()))
}

/// Predicate over grid timestamps. All set criteria must hold (logical AND);
/// the default filter retains everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub month: Option<YearMonth>,
    pub date_range: Option<DateRange>,
    pub days: Option<BTreeSet<u8>>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn month(month: YearMonth) -> Self {
        Self {
            month: Some(month),
            ..Self::default()
        }
    }

    pub fn between(start: Date, end: Date) -> Result<Self, FilterError> {
        if start > end {
            return Err(FilterError::InvertedRange { start, end });
        }
        Ok(Self {
            date_range: Some(DateRange {
                start: Some(start),
                end: Some(end),
            }),
            ..Self::default()
        })
    }

    pub fn on_days<I: IntoIterator<Item = u8>>(days: I) -> Result<Self, FilterError> {
        let days: BTreeSet<u8> = days.into_iter().collect();
        if let Some(bad) = days.iter().find(|d| **d > 6) {
            return Err(FilterError::InvalidDay(bad.to_string()));
        }
        Ok(Self {
            days: Some(days),
            ..Self::default()
        })
    }

    /// Build a filter from its wire encoding. Empty strings count as absent.
    ///
    /// `days` accepts a single index or a comma separated list (`5,6`).
    pub fn from_params(
        month: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        days: Option<&str>,
    ) -> Result<Self, FilterError> {
        fn present(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|s| !s.is_empty())
        }

        let month = present(month).map(str::parse::<YearMonth>).transpose()?;

        let start = present(start_date).map(parse_date).transpose()?;
        let end = present(end_date).map(parse_date).transpose()?;
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(FilterError::InvertedRange { start: s, end: e });
            }
        }
        let date_range = (start.is_some() || end.is_some()).then_some(DateRange { start, end });

        let days = match present(days) {
            Some(raw) => {
                let mut set = BTreeSet::new();
                for part in raw.split(',') {
                    let part = part.trim();
                    let day: u8 = part
                        .parse()
                        .map_err(|_| FilterError::InvalidDay(part.to_string()))?;
                    if day > 6 {
                        return Err(FilterError::InvalidDay(part.to_string()));
                    }
                    set.insert(day);
                }
                Some(set)
            }
            None => None,
        };

        Ok(Self {
            month,
            date_range,
            days,
        })
    }

    pub fn is_unfiltered(&self) -> bool {
        self.month.is_none() && self.date_range.is_none() && self.days.is_none()
    }

    pub fn matches(&self, ts: PrimitiveDateTime) -> bool {
        let date = ts.date();
        if let Some(month) = &self.month {
            if !month.contains(date) {
                return false;
            }
        }
        if let Some(range) = &self.date_range {
            if !range.contains(date) {
                return false;
            }
        }
        if let Some(days) = &self.days {
            if !days.contains(&day_index(date.weekday())) {
                return false;
            }
        }
        true
    }

    /// Indices of the grid slots this filter retains, in ascending order.
    pub fn retained_indices(&self, grid: &TimeGrid) -> Vec<usize> {
        if self.is_unfiltered() {
            return (0..grid.len()).collect();
        }
        grid.timestamps()
            .enumerate()
            .filter(|(_, ts)| self.matches(*ts))
            .map(|(i, _)| i)
            .collect()
    }
}
