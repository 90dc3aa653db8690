use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::{ConfirmationError, UserServiceError};

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("User not found")]
    UserNotFound,

    #[error("Email already registered")]
    Conflict,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::InvalidEmail | UserServiceError::WeakPassword => {
                AppError::Validation(err.to_string())
            }
            UserServiceError::EmailTaken => AppError::Conflict,
            UserServiceError::UserNotFound => AppError::UserNotFound,
            UserServiceError::HashingError(_)
            | UserServiceError::RepositoryError(_)
            | UserServiceError::ConfirmationError(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<ConfirmationError> for AppError {
    fn from(err: ConfirmationError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            AppError::UserNotFound => (
                StatusCode::NOT_FOUND,
                "user_not_found",
                "User not found".to_string(),
            ),
            AppError::Conflict => (
                StatusCode::CONFLICT,
                "email_taken",
                "Email already registered".to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg),
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({
            "error": error_code,
            "error_description": message,
        });

        (status, Json(body)).into_response()
    }
}
