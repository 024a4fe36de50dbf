use super::{Slot, SlotFlag};

/// Per-channel completeness counts over a set of grid slots.
///
/// `present + missing == total_slots` and `zero + non_zero <= present` hold for
/// every report built by [`QualityReport::from_slots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct QualityReport {
    pub total_slots: usize,
    pub present: usize,
    pub missing: usize,
    pub zero: usize,
    pub non_zero: usize,
    /// Readings nulled by the sanitizer (negative or above the ceiling).
    pub rejected: usize,
    pub interpolated: usize,
}

impl QualityReport {
    pub fn from_slots<'a, I>(slots: I) -> Self
    where
        I: IntoIterator<Item = &'a Slot>,
    {
        let mut report = QualityReport::default();
        for slot in slots {
            report.total_slots += 1;
            match slot.value {
                Some(v) => {
                    report.present += 1;
                    if v == 0.0 {
                        report.zero += 1;
                    } else {
                        report.non_zero += 1;
                    }
                }
                None => report.missing += 1,
            }
            match slot.flag {
                SlotFlag::Rejected => report.rejected += 1,
                SlotFlag::Interpolated => report.interpolated += 1,
                SlotFlag::Measured | SlotFlag::Missing => {}
            }
        }
        report
    }

    /// Fraction of slots holding a value, 0 when there are no slots.
    pub fn coverage(&self) -> f64 {
        if self.total_slots == 0 {
            0.0
        } else {
            self.present as f64 / self.total_slots as f64
        }
    }
}
