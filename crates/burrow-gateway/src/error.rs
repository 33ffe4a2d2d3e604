use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use burrow_core::{CoreError, ShortenerError};
use tracing::{error, warn};

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    /// The request may succeed if retried later.
    Unavailable(String),
    Internal(String),
}

impl From<ShortenerError> for AppError {
    fn from(err: ShortenerError) -> Self {
        match err {
            ShortenerError::Validation(message) => Self::BadRequest(message),
            ShortenerError::NotFound(what) => Self::NotFound(format!("'{what}' not found")),
            err @ ShortenerError::ExhaustedRetries { .. } => Self::Unavailable(err.to_string()),
            err @ (ShortenerError::Conflict(_) | ShortenerError::Storage(_)) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::Unavailable(message) => {
                warn!(error = %message, "request failed, retry later");
                (StatusCode::SERVICE_UNAVAILABLE, message)
            }
            AppError::Internal(message) => {
                error!(error = %message, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
