use time::{macros::datetime, Duration, PrimitiveDateTime};

use super::Channel;

/// Fixed-step timestamp index shared by the channel series of one ingestion run.
///
/// Slot `i` sits at `start + i * step`. Timestamps are naive wall-clock times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeGrid {
    start: PrimitiveDateTime,
    step: Duration,
    len: usize,
}

impl TimeGrid {
    pub fn new(start: PrimitiveDateTime, step: Duration, len: usize) -> Self {
        Self { start, step, len }
    }

    /// Grid covering `first..=last`. Both ends are expected to already sit on
    /// step boundaries; `last` before `first` yields an empty grid.
    pub fn spanning(first: PrimitiveDateTime, last: PrimitiveDateTime, step: Duration) -> Self {
        if last < first || step <= Duration::ZERO {
            return Self::empty(step);
        }
        let slots = (last - first).whole_seconds() / step.whole_seconds();
        Self {
            start: first,
            step,
            len: slots as usize + 1,
        }
    }

    pub fn empty(step: Duration) -> Self {
        Self {
            start: datetime!(1970-01-01 00:00),
            step,
            len: 0,
        }
    }

    pub fn start(&self) -> PrimitiveDateTime {
        self.start
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Timestamp of the last slot, if any.
    pub fn end(&self) -> Option<PrimitiveDateTime> {
        self.len.checked_sub(1).map(|i| self.timestamp(i))
    }

    pub fn timestamp(&self, index: usize) -> PrimitiveDateTime {
        self.start + Duration::seconds(self.step.whole_seconds() * index as i64)
    }

    pub fn index_of(&self, ts: PrimitiveDateTime) -> Option<usize> {
        if ts < self.start {
            return None;
        }
        let offset = (ts - self.start).whole_seconds();
        let step = self.step.whole_seconds();
        if step <= 0 || offset % step != 0 {
            return None;
        }
        let index = (offset / step) as usize;
        (index < self.len).then_some(index)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = PrimitiveDateTime> + '_ {
        (0..self.len).map(move |i| self.timestamp(i))
    }

    /// Hours of wall-clock time represented by one slot.
    pub fn slot_hours(&self) -> f64 {
        self.step.whole_seconds() as f64 / 3600.0
    }
}

/// Floors `ts` onto the `step` boundary within its day.
pub fn align_to_step(ts: PrimitiveDateTime, step: Duration) -> PrimitiveDateTime {
    let step_secs = step.whole_seconds();
    if step_secs <= 0 {
        return ts;
    }
    let t = ts.time();
    let secs = t.hour() as i64 * 3600 + t.minute() as i64 * 60 + t.second() as i64;
    ts.date().midnight() + Duration::seconds(secs - secs % step_secs)
}

/// Provenance of a grid slot's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SlotFlag {
    /// Reading taken as-is from a source file.
    Measured,
    /// No reading for this slot.
    Missing,
    /// Reading existed but was nulled by sanitization.
    Rejected,
    /// Gap filled by linear interpolation.
    Interpolated,
}

impl SlotFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotFlag::Measured => "measured",
            SlotFlag::Missing => "missing",
            SlotFlag::Rejected => "rejected",
            SlotFlag::Interpolated => "interpolated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "measured" => Some(SlotFlag::Measured),
            "missing" => Some(SlotFlag::Missing),
            "rejected" => Some(SlotFlag::Rejected),
            "interpolated" => Some(SlotFlag::Interpolated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub value: Option<f64>,
    pub flag: SlotFlag,
}

impl Slot {
    pub fn measured(value: f64) -> Self {
        Self {
            value: Some(value),
            flag: SlotFlag::Measured,
        }
    }

    pub fn missing() -> Self {
        Self {
            value: None,
            flag: SlotFlag::Missing,
        }
    }

    pub fn rejected() -> Self {
        Self {
            value: None,
            flag: SlotFlag::Rejected,
        }
    }

    pub fn interpolated(value: f64) -> Self {
        Self {
            value: Some(value),
            flag: SlotFlag::Interpolated,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SeriesError {
    #[error("series has {actual} slots but its grid has {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Grid-aligned power values for one channel.
///
/// Every grid slot has exactly one entry; gaps are explicit `Missing` slots,
/// so timestamps are strictly increasing and evenly spaced by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSeries {
    channel: Channel,
    grid: TimeGrid,
    slots: Vec<Slot>,
}

impl ChannelSeries {
    pub fn new(channel: Channel, grid: TimeGrid, slots: Vec<Slot>) -> Result<Self, SeriesError> {
        if slots.len() != grid.len() {
            return Err(SeriesError::LengthMismatch {
                expected: grid.len(),
                actual: slots.len(),
            });
        }
        Ok(Self {
            channel,
            grid,
            slots,
        })
    }

    pub fn empty(channel: Channel, grid: TimeGrid) -> Self {
        Self {
            channel,
            grid,
            slots: vec![Slot::missing(); grid.len()],
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PrimitiveDateTime, &Slot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(move |(i, slot)| (self.grid.timestamp(i), slot))
    }

    pub fn value_at(&self, ts: PrimitiveDateTime) -> Option<f64> {
        self.grid
            .index_of(ts)
            .and_then(|i| self.slots.get(i))
            .and_then(|s| s.value)
    }

    pub fn present_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.slots.iter().filter_map(|s| s.value)
    }
}
