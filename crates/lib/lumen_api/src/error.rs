//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::inference::InferenceError;

/// Body of every chat failure response.
pub const CHAT_FAILURE_MESSAGE: &str = "Failed to process request";

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// JSON error envelope returned with status 500.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid chat request: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Not found")]
    NotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidRequest(_) | AppError::Inference(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: CHAT_FAILURE_MESSAGE.to_string(),
                }),
            )
                .into_response(),
            AppError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response()
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
        }
    }
}
