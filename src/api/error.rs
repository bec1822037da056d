//! API-layer error type rendered as JSON

use crate::error::ForecastError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// API-layer error
#[derive(Debug)]
pub enum ApiError {
    /// 400 - Bad request (invalid input)
    BadRequest(String),

    /// 404 - Unknown resource (e.g. scenario id)
    NotFound(String),

    /// 500 - Internal error
    Internal(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorBody {
            error: error_type.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::ValidationError(msg)
            | ForecastError::InvalidParameter(msg)
            | ForecastError::ScenarioError(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
