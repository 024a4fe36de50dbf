use energy_client::{Channel, Filter, Slot};
use time::PrimitiveDateTime;

use crate::dataset::Dataset;

/// The grid slots of a dataset retained by a filter. Both channels share the
/// same retained index set.
pub(crate) struct View<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> View<'a> {
    pub(crate) fn new(dataset: &'a Dataset, filter: &Filter) -> Self {
        Self {
            indices: filter.retained_indices(dataset.grid()),
            dataset,
        }
    }

    pub(crate) fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Number of retained grid slots, present or not.
    pub(crate) fn len(&self) -> usize {
        self.indices.len()
    }

    pub(crate) fn slots(&self, channel: Channel) -> impl Iterator<Item = &'a Slot> + '_ {
        let slots = self.dataset.series(channel).slots();
        self.indices.iter().map(move |&i| &slots[i])
    }

    pub(crate) fn points(
        &self,
        channel: Channel,
    ) -> impl Iterator<Item = (PrimitiveDateTime, Option<f64>)> + '_ {
        let grid = self.dataset.grid();
        let slots = self.dataset.series(channel).slots();
        self.indices
            .iter()
            .map(move |&i| (grid.timestamp(i), slots[i].value))
    }

    /// Retained readings of `channel` that carry a value.
    pub(crate) fn readings(&self, channel: Channel) -> impl Iterator<Item = (PrimitiveDateTime, f64)> + '_ {
        self.points(channel).filter_map(|(ts, v)| v.map(|v| (ts, v)))
    }

    pub(crate) fn values(&self, channel: Channel) -> Vec<f64> {
        self.slots(channel).filter_map(|s| s.value).collect()
    }

    /// Retained timestamps where both channels carry a value.
    pub(crate) fn paired(&self) -> impl Iterator<Item = (PrimitiveDateTime, f64, f64)> + '_ {
        let grid = self.dataset.grid();
        let a = self.dataset.series(Channel::A).slots();
        let b = self.dataset.series(Channel::B).slots();
        self.indices.iter().filter_map(move |&i| match (a[i].value, b[i].value) {
            (Some(x), Some(y)) => Some((grid.timestamp(i), x, y)),
            _ => None,
        })
    }
}
