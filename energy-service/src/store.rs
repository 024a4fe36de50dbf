use std::sync::Arc;

use parking_lot::RwLock;

use crate::dataset::Dataset;

/// Holds the dataset currently served. Readers take an `Arc` snapshot and
/// compute without the lock; a reload swaps in a fully built replacement.
#[derive(Debug)]
pub struct DatasetStore {
    current: RwLock<Arc<Dataset>>,
}

impl DatasetStore {
    pub fn new(dataset: Dataset) -> Self {
        metrics::gauge!("dataset_grid_slots").set(dataset.grid().len() as f64);
        Self {
            current: RwLock::new(Arc::new(dataset)),
        }
    }

    pub fn snapshot(&self) -> Arc<Dataset> {
        self.current.read().clone()
    }

    /// Installs `dataset` and returns the one it replaced.
    pub fn replace(&self, dataset: Dataset) -> Arc<Dataset> {
        let next = Arc::new(dataset);
        metrics::gauge!("dataset_grid_slots").set(next.grid().len() as f64);
        std::mem::replace(&mut *self.current.write(), next)
    }
}
