// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ServiceResponse;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("User already exists.")]
    UserAlreadyExists,

    #[error("User not found.")]
    UserNotFound,

    #[error("Wrong password.")]
    WrongPassword,

    #[error("Token expired.")]
    SessionExpired,

    #[error("Session was refreshed concurrently.")]
    ConcurrentRefresh,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UserAlreadyExists | AppError::WrongPassword | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::SessionExpired | AppError::Unauthorized | AppError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::ConcurrentRefresh => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                "Database error".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ServiceResponse::<()>::failure(message);
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
