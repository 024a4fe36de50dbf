use std::path::{Path, PathBuf};

use futures::StreamExt;
use walkdir::WalkDir;

use super::{read_file, RawTable, SourceFormat};
use crate::pipeline::{Envelope, ItemStream, PipelineError, Source};

/// All `.csv` / `.xlsx` files below `root`, sorted by path.
pub fn discover_files(root: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    if !root.is_dir() {
        return Err(PipelineError::Read {
            path: root.to_path_buf(),
            message: "data directory does not exist".to_string(),
        });
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| SourceFormat::from_path(p).is_some())
        .collect();
    files.sort();
    Ok(files)
}

/// Streams one [`RawTable`] per discovered file.
///
/// Files are parsed on the blocking pool, `concurrency` at a time, but items
/// are yielded in sorted path order so downstream merging is deterministic.
/// A file that fails to parse yields an `Err` item; the stream continues.
pub struct DirectorySource {
    root: PathBuf,
    csv_delimiter: u8,
    concurrency: usize,
}

impl DirectorySource {
    pub fn new<P: Into<PathBuf>>(root: P, csv_delimiter: u8, concurrency: usize) -> Self {
        Self {
            root: root.into(),
            csv_delimiter,
            concurrency: concurrency.max(1),
        }
    }
}

async fn read_in_background(path: PathBuf, delimiter: u8) -> Result<Envelope<RawTable>, PipelineError> {
    let task_path = path.clone();
    let table = tokio::task::spawn_blocking(move || read_file(&task_path, delimiter))
        .await
        .map_err(|e| PipelineError::Read {
            path: path.clone(),
            message: format!("reader task failed: {e}"),
        })??;
    tracing::debug!(path = %path.display(), rows = table.rows.len(), "file read");
    Ok(Envelope::new(table, path))
}

#[async_trait::async_trait]
impl Source<RawTable> for DirectorySource {
    async fn stream(&self) -> ItemStream<RawTable> {
        let root = self.root.clone();
        let delimiter = self.csv_delimiter;
        let concurrency = self.concurrency;

        let s = async_stream::stream! {
            match discover_files(&root) {
                Err(e) => yield Err(e),
                Ok(paths) => {
                    tracing::info!(root = %root.display(), files = paths.len(), "discovered data files");

                    let reads = futures::stream::iter(paths)
                        .map(move |path| read_in_background(path, delimiter))
                        .buffered(concurrency);
                    futures::pin_mut!(reads);

                    while let Some(item) = reads.next().await {
                        yield item;
                    }
                }
            }
        };

        Box::pin(s)
    }
}
