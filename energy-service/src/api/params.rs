use std::str::FromStr;

use energy_client::Filter;
use serde::Deserialize;

use super::error::ApiError;
use crate::analytics::{Aggregation, MAX_BINS};

/// Query string accepted by every metrics endpoint. Endpoints ignore the
/// parameters that do not apply to them.
#[derive(Debug, Default, Deserialize)]
pub struct MetricsQuery {
    pub month: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub day: Option<String>,
    pub aggregation: Option<String>,
    pub bins: Option<String>,
    pub top_n: Option<String>,
}

fn parse_opt<T: FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("invalid {name} '{s}'"))),
    }
}

impl MetricsQuery {
    pub fn filter(&self) -> Result<Filter, ApiError> {
        Ok(Filter::from_params(
            self.month.as_deref(),
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            self.day.as_deref(),
        )?)
    }

    pub fn aggregation(&self) -> Result<Aggregation, ApiError> {
        Ok(parse_opt("aggregation", self.aggregation.as_deref())?.unwrap_or_default())
    }

    pub fn bins(&self) -> Result<Option<usize>, ApiError> {
        match parse_opt::<usize>("bins", self.bins.as_deref())? {
            Some(0) => Err(ApiError::BadRequest("bins must be at least 1".to_string())),
            Some(n) if n > MAX_BINS => Err(ApiError::BadRequest(format!(
                "bins must be at most {MAX_BINS}"
            ))),
            other => Ok(other),
        }
    }

    pub fn top_n(&self) -> Result<Option<usize>, ApiError> {
        parse_opt("top_n", self.top_n.as_deref())
    }
}
