use std::collections::BTreeSet;

use energy_client::{Channel, Filter, QualityReport, YearMonth};
use serde::Serialize;

use super::{format_timestamp, MetricsEngine, PerChannel, View};
use crate::dataset::{Dataset, IngestSummary};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    #[serde(flatten)]
    pub report: QualityReport,
    pub coverage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateSpan {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataInfo {
    /// Grid slots, present or missing.
    pub total_records: usize,
    pub date_range: Option<DateSpan>,
    /// `YYYY-MM` of every month the grid touches.
    pub available_months: Vec<String>,
    pub per_channel_coverage: PerChannel<f64>,
    pub fingerprint: String,
    pub ingest: IngestSummary,
}

pub(crate) fn date_span(dataset: &Dataset) -> Option<DateSpan> {
    let grid = dataset.grid();
    grid.end().map(|end| DateSpan {
        start: format_timestamp(grid.start()),
        end: format_timestamp(end),
    })
}

impl MetricsEngine {
    pub fn data_quality(&self, dataset: &Dataset, filter: &Filter) -> PerChannel<DataQuality> {
        let view = View::new(dataset, filter);
        PerChannel::from_fn(|c| {
            let report = QualityReport::from_slots(view.slots(c));
            DataQuality {
                coverage: report.coverage(),
                report,
            }
        })
    }

    pub fn data_info(&self, dataset: &Dataset) -> DataInfo {
        let months: BTreeSet<YearMonth> = dataset
            .grid()
            .timestamps()
            .map(|ts| YearMonth::of(ts.date()))
            .collect();
        DataInfo {
            total_records: dataset.grid().len(),
            date_range: date_span(dataset),
            available_months: months.iter().map(YearMonth::to_string).collect(),
            per_channel_coverage: PerChannel::from_fn(|c: Channel| {
                QualityReport::from_slots(dataset.series(c).slots()).coverage()
            }),
            fingerprint: dataset.fingerprint(),
            ingest: dataset.ingest().clone(),
        }
    }
}
