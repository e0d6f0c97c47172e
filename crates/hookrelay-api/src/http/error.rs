//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use hookrelay_types::error::{DispatchError, RepositoryError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Dispatch errors; only unregistered paths and malformed bodies are
    /// ever returned by the dispatcher.
    Dispatch(DispatchError),
    /// Registry storage errors.
    Repository(RepositoryError),
    /// Resource not found.
    NotFound(String),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<DispatchError> for AppError {
    fn from(e: DispatchError) -> Self {
        AppError::Dispatch(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Dispatch(DispatchError::EventNotRegistered(path)) => (
                StatusCode::NOT_FOUND,
                "EVENT_NOT_REGISTERED",
                format!("The requested webhook \"{path}\" is not registered."),
            ),
            AppError::Dispatch(DispatchError::MalformedRequest(msg)) => {
                (StatusCode::BAD_REQUEST, "MALFORMED_REQUEST", msg.clone())
            }
            AppError::Dispatch(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DISPATCH_ERROR",
                e.to_string(),
            ),
            AppError::Repository(RepositoryError::NotFound) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", "Entity not found".to_string())
            }
            AppError::Repository(RepositoryError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            AppError::Repository(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "REPOSITORY_ERROR",
                e.to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, error = %message, "request failed");
        }

        let mut response = ApiResponse::error(code, &message, uuid::Uuid::now_v7().to_string(), 0)
            .into_response();
        *response.status_mut() = status;
        response
    }
}
