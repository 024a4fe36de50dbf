use time::Duration;

use crate::{
    config::AppConfig,
    dataset::Dataset,
    pipeline::{Pipeline, PipelineError, Sink},
    sinks::ProcessedCsvCache,
    sources::DirectorySource,
    transform::{ColumnNormalizer, TemporalCleaner, ValueSanitizer},
};

pub fn build_pipeline(cfg: &AppConfig) -> Pipeline<DirectorySource> {
    let root = cfg.data.root_dir.clone();
    Pipeline {
        source: DirectorySource::new(
            root.clone(),
            cfg.data.csv_delimiter as u8,
            cfg.data.read_concurrency,
        ),
        root,
        normalizer: ColumnNormalizer::new(&cfg.data, &cfg.channels),
        cleaner: TemporalCleaner::new(&cfg.cleaning),
        sanitizer: ValueSanitizer::new(&cfg.cleaning),
    }
}

fn cache(cfg: &AppConfig) -> Option<ProcessedCsvCache> {
    let step = Duration::minutes(cfg.cleaning.interval_minutes);
    cfg.data
        .cache_dir
        .as_ref()
        .map(|dir| ProcessedCsvCache::new(dir.clone(), step))
}

/// Produces the dataset to serve.
///
/// With `prefer_cache` and a usable processed cache, the raw tree is not
/// read. Otherwise the full pipeline runs and, if a cache directory is
/// configured, the result is written back to it. Cache failures are logged
/// and never fail the load.
pub async fn load_dataset(cfg: &AppConfig, prefer_cache: bool) -> Result<Dataset, PipelineError> {
    let cache = cache(cfg);

    if prefer_cache {
        if let Some(cache) = cache.clone() {
            let dir = cache.dir().to_path_buf();
            match tokio::task::spawn_blocking(move || cache.read_blocking()).await {
                Ok(Ok(Some(dataset))) => {
                    tracing::info!(dir = %dir.display(), slots = dataset.grid().len(), "loaded processed cache");
                    return Ok(dataset);
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "ignoring unreadable processed cache"),
                Err(e) => tracing::warn!(error = %e, "cache read task failed"),
            }
        }
    }

    let dataset = build_pipeline(cfg).run().await?;

    if let Some(cache) = cache {
        if let Err(e) = cache.write(&dataset).await {
            tracing::warn!(error = %e, "failed to write processed cache");
        }
    }

    Ok(dataset)
}
