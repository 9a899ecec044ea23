use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    RateLimitExceeded,
    CacheUnavailable,
    OriginFailure,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please try again later.".to_string(),
            ),
            AppError::CacheUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Cache backend is unavailable".to_string(),
            ),
            AppError::OriginFailure => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to produce fresh data".to_string(),
            ),
        };

        let body = Json(ErrorResponse { error });

        (status, body).into_response()
    }
}
