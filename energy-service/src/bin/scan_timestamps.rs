use anyhow::Result;
use energy_service::{
    config::AppConfig,
    observability,
    pipeline::{Envelope, Transform},
    sources::{discover_files, read_file},
    transform::{row_timestamp, ColumnNormalizer, RowTimestamp},
};
use std::env;

const DEFAULT_EXAMPLES: usize = 5;

/// Reports rows whose Date/Time fields do not yield a usable timestamp.
///
/// usage: scan_timestamps [max_examples_per_file]
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let max_examples = env::args()
        .nth(1)
        .map(|s| s.parse::<usize>())
        .transpose()?
        .unwrap_or(DEFAULT_EXAMPLES);

    let cfg = AppConfig::load()?;
    let normalizer = ColumnNormalizer::new(&cfg.data, &cfg.channels);
    let delimiter = cfg.data.csv_delimiter as u8;
    let policy = cfg.cleaning.end_of_day_policy;

    let files = discover_files(&cfg.data.root_dir)?;
    let mut files_with_issues = 0usize;
    let mut total_bad = 0usize;

    for path in &files {
        let table = match read_file(path, delimiter)
            .and_then(|raw| normalizer.apply(Envelope::new(raw, path.clone())))
        {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot scan file");
                continue;
            }
        };

        let mut end_of_day = 0usize;
        let mut invalid = Vec::new();
        for (line, row) in table.rows.iter().enumerate() {
            match row_timestamp(&row.date, &row.time, policy) {
                RowTimestamp::Valid(_) => {}
                RowTimestamp::EndOfDay => end_of_day += 1,
                RowTimestamp::Invalid => invalid.push((line + 2, &row.date, &row.time)),
            }
        }

        if end_of_day == 0 && invalid.is_empty() {
            continue;
        }
        files_with_issues += 1;
        total_bad += end_of_day + invalid.len();
        tracing::info!(
            path = %path.display(),
            rows = table.rows.len(),
            end_of_day,
            invalid = invalid.len(),
            "rows without a usable timestamp"
        );
        for (line, date, time) in invalid.iter().take(max_examples) {
            tracing::info!(line, date = %date, time = %time, "  example");
        }
    }

    tracing::info!(
        files = files.len(),
        files_with_issues,
        bad_rows = total_bad,
        "timestamp scan complete"
    );
    Ok(())
}
