//! Fixed responses for routing errors.

use crate::error::AppError;

/// Any method other than `POST` on the chat endpoint.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Unknown path under `/api/`.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
