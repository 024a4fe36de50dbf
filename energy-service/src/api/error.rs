use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use energy_client::FilterError;
use serde_json::json;

use crate::{forecast::ForecastError, pipeline::PipelineError};

/// Failures surfaced to HTTP clients. An empty selection is not one of
/// them: it is a 200 with zero-valued metrics.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Forecast(#[from] ForecastError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Filter(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forecast(ForecastError::UnknownScenario(_) | ForecastError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Forecast(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Pipeline(PipelineError::NoData(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
