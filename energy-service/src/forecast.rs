use std::path::PathBuf;

use energy_client::{Channel, ForecastArtifact, ForecastScenario, ForecastSeries};
use serde::Serialize;

use crate::analytics::{stats, PerChannel};

#[derive(thiserror::Error, Debug)]
pub enum ForecastError {
    #[error("unknown forecast scenario '{0}', expected 1_week or 1_month")]
    UnknownScenario(String),
    #[error("no forecast available for scenario {0}")]
    NotFound(ForecastScenario),
    #[error("malformed forecast artifact {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
    #[error("failed to read forecast artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error figures of a predicted-vs-actual series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastAccuracy {
    pub points: usize,
    pub mae: f64,
    pub rmse: f64,
    /// Mean absolute percentage error over points with a non-zero actual.
    pub mape: f64,
    pub r2: f64,
}

impl ForecastAccuracy {
    pub fn of(series: &ForecastSeries) -> Self {
        let n = series.predicted.len().min(series.actual.len());
        if n == 0 {
            return Self::default();
        }
        let (pred, actual) = (&series.predicted[..n], &series.actual[..n]);
        let errors: Vec<f64> = pred.iter().zip(actual).map(|(p, a)| a - p).collect();
        let abs: Vec<f64> = errors.iter().map(|e| e.abs()).collect();
        let sq: Vec<f64> = errors.iter().map(|e| e * e).collect();
        let pct: Vec<f64> = actual
            .iter()
            .zip(&errors)
            .filter(|(a, _)| **a != 0.0)
            .map(|(a, e)| (e / a).abs() * 100.0)
            .collect();

        let mean_actual = stats::mean(actual);
        let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
        let ss_res: f64 = sq.iter().sum();
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

        Self {
            points: n,
            mae: stats::mean(&abs),
            rmse: stats::mean(&sq).sqrt(),
            mape: stats::mean(&pct),
            r2,
        }
    }
}

/// A forecast artifact as published, plus accuracy figures derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    #[serde(flatten)]
    pub artifact: ForecastArtifact,
    pub accuracy: PerChannel<ForecastAccuracy>,
}

/// Reads `forecast_<scenario>.json` artifacts from a directory.
#[derive(Debug, Clone, Default)]
pub struct ForecastRepository {
    dir: Option<PathBuf>,
}

impl ForecastRepository {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn artifact_path(&self, scenario: ForecastScenario) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|d| d.join(format!("forecast_{}.json", scenario.as_str())))
    }

    pub async fn load(&self, scenario: &str) -> Result<ForecastReport, ForecastError> {
        let scenario: ForecastScenario = scenario
            .parse()
            .map_err(|_| ForecastError::UnknownScenario(scenario.to_string()))?;
        let path = self
            .artifact_path(scenario)
            .ok_or(ForecastError::NotFound(scenario))?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ForecastError::NotFound(scenario))
            }
            Err(source) => return Err(ForecastError::Io { path, source }),
        };

        let mut artifact: ForecastArtifact =
            serde_json::from_slice(&bytes).map_err(|e| ForecastError::Malformed {
                path: path.clone(),
                message: e.to_string(),
            })?;
        for channel in Channel::ALL {
            if !artifact.series(channel).is_aligned() {
                return Err(ForecastError::Malformed {
                    path,
                    message: format!("{} arrays differ in length", channel.key()),
                });
            }
        }
        if artifact.scenario.is_empty() {
            artifact.scenario = scenario.as_str().to_string();
        }

        let accuracy = PerChannel::from_fn(|c| ForecastAccuracy::of(artifact.series(c)));
        Ok(ForecastReport { artifact, accuracy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(predicted: &[f64], actual: &[f64]) -> ForecastSeries {
        ForecastSeries {
            model: Some("ets".to_string()),
            dates: (0..predicted.len()).map(|i| format!("2025-01-{:02}", i + 1)).collect(),
            predicted: predicted.to_vec(),
            actual: actual.to_vec(),
        }
    }

    #[test]
    fn accuracy_of_a_perfect_forecast() {
        let acc = ForecastAccuracy::of(&series(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]));
        assert_eq!(acc.mae, 0.0);
        assert_eq!(acc.rmse, 0.0);
        assert_eq!(acc.r2, 1.0);
    }

    #[test]
    fn mape_skips_zero_actuals() {
        let acc = ForecastAccuracy::of(&series(&[1.0, 3.0], &[0.0, 2.0]));
        assert_eq!(acc.mape, 50.0);
        assert_eq!(acc.mae, 1.0);
        assert_eq!(acc.points, 2);
    }

    #[tokio::test]
    async fn unknown_scenario_and_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ForecastRepository::new(Some(dir.path().to_path_buf()));
        assert!(matches!(repo.load("2_weeks").await, Err(ForecastError::UnknownScenario(_))));
        assert!(matches!(
            repo.load("1_week").await,
            Err(ForecastError::NotFound(ForecastScenario::OneWeek))
        ));
        assert!(matches!(
            ForecastRepository::default().load("1_month").await,
            Err(ForecastError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn loads_artifact_and_rejects_ragged_arrays() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("forecast_1_week.json"),
            r#"{"tourA":{"model":"prophet","dates":["2025-01-01"],"predicted":[2.0],"actual":[4.0]},
                "tourB":{"dates":[],"predicted":[],"actual":[]}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("forecast_1_month.json"),
            r#"{"tourA":{"dates":["2025-01-01"],"predicted":[],"actual":[1.0]},
                "tourB":{"dates":[],"predicted":[],"actual":[]}}"#,
        )
        .unwrap();
        let repo = ForecastRepository::new(Some(dir.path().to_path_buf()));

        let report = repo.load("1_week").await.unwrap();
        assert_eq!(report.artifact.scenario, "1_week");
        assert_eq!(report.accuracy.tour_a.mae, 2.0);
        assert_eq!(report.accuracy.tour_b.points, 0);

        assert!(matches!(repo.load("1_month").await, Err(ForecastError::Malformed { .. })));
    }
}
