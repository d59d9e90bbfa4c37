use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::{CatalogError, ViewportError};
use crate::telemetry::TelemetryError;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request failure as seen by HTTP clients.
///
/// Caller errors carry a message that explains how to fix the request.
/// Internal errors are logged with their cause and returned opaque.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl From<ViewportError> for ApiError {
    fn from(err: ViewportError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Internal(anyhow::Error::new(err))
    }
}

impl From<TelemetryError> for ApiError {
    fn from(err: TelemetryError) -> Self {
        match err {
            TelemetryError::MissingCameraId
            | TelemetryError::InvalidDuration(_)
            | TelemetryError::DurationTooLarge { .. } => ApiError::BadRequest(err.to_string()),
            TelemetryError::Instrument(_) | TelemetryError::Snapshot => {
                ApiError::Internal(anyhow::Error::new(err))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(message) => {
                tracing::debug!(%message, "rejected request");
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(source) => {
                tracing::error!(error = ?source, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
