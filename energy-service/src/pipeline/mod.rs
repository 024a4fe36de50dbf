//! Ingestion stages wired as Source -> Transform chain.
//!
//! Every stage after the source is a pure transformation: it takes its input
//! by value or reference and returns a new value, so each one can be tested
//! in isolation.

use std::{path::PathBuf, pin::Pin};

use energy_client::SeriesError;
use futures::{Stream, StreamExt};

use crate::{
    dataset::{Dataset, IngestSummary},
    sources::RawTable,
    transform::{CleanedTable, ColumnNormalizer, NormalizedTable, SanitizedPair, TemporalCleaner, ValueSanitizer},
};

/// A payload tagged with the file it came from.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub origin: PathBuf,
}

impl<T> Envelope<T> {
    pub fn new<P: Into<PathBuf>>(payload: T, origin: P) -> Self {
        Self {
            payload,
            origin: origin.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("failed to read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },
    #[error("failed to write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },
    #[error("unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("{} has no '{column}' column", path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("no file under {} yielded a valid reading", .0.display())]
    NoData(PathBuf),
    #[error("cache error: {0}")]
    Cache(String),
    #[error("channel series do not share one time grid")]
    GridMismatch,
    #[error(transparent)]
    Series(#[from] SeriesError),
}

pub type ItemStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> ItemStream<T>;
}

pub trait Transform<I, O>: Send + Sync {
    fn apply(&self, input: I) -> Result<O, PipelineError>;
}

/// Asynchronous consumer of a finished pipeline product.
#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    async fn write(&self, item: &T) -> Result<(), PipelineError>;
}

/// One full ingestion run: per-file reads and column normalization stream
/// in path order, then the merged rows are cleaned and sanitized as a batch.
pub struct Pipeline<S> {
    pub root: PathBuf,
    pub source: S,
    pub normalizer: ColumnNormalizer,
    pub cleaner: TemporalCleaner,
    pub sanitizer: ValueSanitizer,
}

impl<S> Pipeline<S>
where
    S: Source<RawTable> + 'static,
{
    pub async fn run(self) -> Result<Dataset, PipelineError> {
        let mut stream = self.source.stream().await;
        let mut tables: Vec<NormalizedTable> = Vec::new();
        let mut summary = IngestSummary::default();

        while let Some(item) = stream.next().await {
            if let Err(PipelineError::Read { path, message }) = &item {
                if path == &self.root {
                    tracing::error!(root = %path.display(), %message, "cannot scan data directory");
                    continue;
                }
            }
            summary.files_found += 1;
            match item.and_then(|env| self.normalizer.apply(env)) {
                Ok(table) => {
                    tracing::debug!(
                        path = %table.origin.display(),
                        rows = table.rows.len(),
                        "file loaded"
                    );
                    metrics::counter!("ingest_files_loaded_total").increment(1);
                    summary.files_loaded += 1;
                    tables.push(table);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping file");
                    metrics::counter!("ingest_files_skipped_total").increment(1);
                    summary.files_skipped += 1;
                }
            }
        }

        let cleaned: CleanedTable = match self.cleaner.apply(tables) {
            Ok(c) => c,
            Err(PipelineError::NoData(_)) => return Err(PipelineError::NoData(self.root)),
            Err(e) => return Err(e),
        };
        let SanitizedPair { tour_a, tour_b, stats } = self.sanitizer.apply(cleaned)?;

        summary.rows_read = stats.rows_in;
        summary.end_of_day_dropped = stats.end_of_day_dropped;
        summary.unparseable_dropped = stats.unparseable_dropped;
        summary.duplicates_dropped = stats.duplicates_dropped;
        summary.realigned = stats.realigned;

        let dataset = Dataset::new(tour_a, tour_b, summary)?;
        tracing::info!(
            files_found = dataset.ingest().files_found,
            files_loaded = dataset.ingest().files_loaded,
            files_skipped = dataset.ingest().files_skipped,
            rows = dataset.ingest().rows_read,
            grid_slots = dataset.grid().len(),
            "ingestion finished"
        );
        Ok(dataset)
    }
}
