use std::{
    fs,
    path::{Path, PathBuf},
};

use energy_client::{Channel, ChannelSeries, Slot, SlotFlag, TimeGrid};
use time::{format_description::FormatItem, macros::format_description, Duration, PrimitiveDateTime};

use crate::{
    dataset::{Dataset, IngestSummary},
    pipeline::{PipelineError, Sink},
};

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const SUMMARY_FILE: &str = "ingest_summary.json";

fn cache_file(channel: Channel) -> &'static str {
    match channel {
        Channel::A => "tour_a_processed.csv",
        Channel::B => "tour_b_processed.csv",
    }
}

fn cache_err<E: std::fmt::Display>(path: &Path, e: E) -> PipelineError {
    PipelineError::Cache(format!("{}: {e}", path.display()))
}

/// Processed-series cache: one `timestamp,power,flag` CSV per channel plus
/// the ingest summary, so a restart can skip the raw tree.
#[derive(Debug, Clone)]
pub struct ProcessedCsvCache {
    dir: PathBuf,
    step: Duration,
}

impl ProcessedCsvCache {
    pub fn new<P: Into<PathBuf>>(dir: P, step: Duration) -> Self {
        Self {
            dir: dir.into(),
            step,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        Channel::ALL
            .iter()
            .all(|c| self.dir.join(cache_file(*c)).is_file())
    }

    pub fn write_blocking(&self, dataset: &Dataset) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.dir).map_err(|e| cache_err(&self.dir, e))?;
        for channel in Channel::ALL {
            let path = self.dir.join(cache_file(channel));
            write_series(&path, dataset.series(channel))?;
        }
        let path = self.dir.join(SUMMARY_FILE);
        let json = serde_json::to_vec_pretty(dataset.ingest()).map_err(|e| cache_err(&path, e))?;
        fs::write(&path, json).map_err(|e| cache_err(&path, e))?;
        tracing::info!(dir = %self.dir.display(), slots = dataset.grid().len(), "processed cache written");
        Ok(())
    }

    /// `Ok(None)` when the cache files are not there.
    pub fn read_blocking(&self) -> Result<Option<Dataset>, PipelineError> {
        if !self.exists() {
            return Ok(None);
        }
        let tour_a = read_series(&self.dir.join(cache_file(Channel::A)), Channel::A, self.step)?;
        let tour_b = read_series(&self.dir.join(cache_file(Channel::B)), Channel::B, self.step)?;

        let summary_path = self.dir.join(SUMMARY_FILE);
        let mut ingest = match fs::read(&summary_path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| cache_err(&summary_path, e))?,
            Err(_) => IngestSummary::default(),
        };
        ingest.from_cache = true;
        Dataset::new(tour_a, tour_b, ingest).map(Some)
    }
}

fn write_series(path: &Path, series: &ChannelSeries) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| cache_err(path, e))?;
    writer
        .write_record(["timestamp", "power", "flag"])
        .map_err(|e| cache_err(path, e))?;
    for (ts, slot) in series.iter() {
        let ts = ts.format(TIMESTAMP_FORMAT).map_err(|e| cache_err(path, e))?;
        let power = slot.value.map(|v| v.to_string()).unwrap_or_default();
        writer
            .write_record([ts.as_str(), power.as_str(), slot.flag.as_str()])
            .map_err(|e| cache_err(path, e))?;
    }
    writer.flush().map_err(|e| cache_err(path, e))
}

fn read_series(path: &Path, channel: Channel, step: Duration) -> Result<ChannelSeries, PipelineError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| cache_err(path, e))?;
    let mut rows: Vec<(PrimitiveDateTime, Slot)> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| cache_err(path, e))?;
        let ts = PrimitiveDateTime::parse(record.get(0).unwrap_or_default(), TIMESTAMP_FORMAT)
            .map_err(|e| cache_err(path, e))?;
        let power = record.get(1).unwrap_or_default();
        let flag = SlotFlag::parse(record.get(2).unwrap_or_default())
            .ok_or_else(|| cache_err(path, "unknown flag"))?;
        let value = if power.is_empty() {
            None
        } else {
            Some(power.parse::<f64>().map_err(|e| cache_err(path, e))?)
        };
        let slot = match (flag, value) {
            (SlotFlag::Measured, Some(v)) => Slot::measured(v),
            (SlotFlag::Interpolated, Some(v)) => Slot::interpolated(v),
            (SlotFlag::Missing, None) => Slot::missing(),
            (SlotFlag::Rejected, None) => Slot::rejected(),
            _ => return Err(cache_err(path, format!("flag '{}' inconsistent with value", flag.as_str()))),
        };
        rows.push((ts, slot));
    }

    let grid = match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => TimeGrid::spanning(first.0, last.0, step),
        _ => TimeGrid::empty(step),
    };
    let mut slots = vec![Slot::missing(); grid.len()];
    for (ts, slot) in rows {
        let i = grid
            .index_of(ts)
            .ok_or_else(|| cache_err(path, format!("{ts} is off the {}-minute grid", step.whole_minutes())))?;
        slots[i] = slot;
    }
    Ok(ChannelSeries::new(channel, grid, slots)?)
}

#[async_trait::async_trait]
impl Sink<Dataset> for ProcessedCsvCache {
    async fn write(&self, item: &Dataset) -> Result<(), PipelineError> {
        let cache = self.clone();
        let dataset = item.clone();
        tokio::task::spawn_blocking(move || cache.write_blocking(&dataset))
            .await
            .map_err(|e| PipelineError::Cache(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn dataset() -> Dataset {
        let grid = TimeGrid::new(datetime!(2025-01-01 00:00), Duration::minutes(15), 4);
        let a = ChannelSeries::new(
            Channel::A,
            grid,
            vec![Slot::measured(1.25), Slot::missing(), Slot::rejected(), Slot::interpolated(0.1)],
        )
        .unwrap();
        let b = ChannelSeries::new(Channel::B, grid, vec![Slot::measured(2.0); 4]).unwrap();
        Dataset::new(
            a,
            b,
            IngestSummary {
                files_loaded: 2,
                ..IngestSummary::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn absent_cache_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProcessedCsvCache::new(dir.path().join("cache"), Duration::minutes(15));
        assert!(cache.read_blocking().unwrap().is_none());
    }

    #[test]
    fn reload_reproduces_series_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProcessedCsvCache::new(dir.path(), Duration::minutes(15));
        let original = dataset();
        cache.write_blocking(&original).unwrap();

        let loaded = cache.read_blocking().unwrap().unwrap();
        assert_eq!(loaded.series(Channel::A), original.series(Channel::A));
        assert_eq!(loaded.series(Channel::B), original.series(Channel::B));
        assert_eq!(loaded.fingerprint(), original.fingerprint());
        assert!(loaded.ingest().from_cache);
        assert_eq!(loaded.ingest().files_loaded, 2);
    }

    #[test]
    fn inconsistent_rows_are_a_cache_error() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["tour_a_processed.csv", "tour_b_processed.csv"] {
            fs::write(
                dir.path().join(name),
                "timestamp,power,flag\n2025-01-01 00:00:00,,measured\n",
            )
            .unwrap();
        }
        let cache = ProcessedCsvCache::new(dir.path(), Duration::minutes(15));
        assert!(matches!(cache.read_blocking(), Err(PipelineError::Cache(_))));
    }
}
