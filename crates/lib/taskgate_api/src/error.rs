//! Application error types.
//!
//! Each error kind maps to exactly one HTTP status and a stable
//! machine-readable code.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use taskgate_core::auth::AuthError;
use taskgate_core::tasks::TaskError;
use thiserror::Error;
use tracing::{debug, error};

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Why a request failed authentication. Each case has its own code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No `Authorization` header.
    NoToken,
    /// Access token failed signature, expiry or class checks.
    BadToken,
    /// No refresh cookie.
    NoRefreshToken,
    /// Refresh cookie failed verification.
    BadRefreshToken,
    /// Wrong e-mail/password pair.
    BadCredentials,
}

impl AuthFailure {
    pub fn code(self) -> &'static str {
        match self {
            AuthFailure::NoToken => "no_token",
            AuthFailure::BadToken => "invalid_token",
            AuthFailure::NoRefreshToken => "no_refresh_token",
            AuthFailure::BadRefreshToken => "invalid_refresh_token",
            AuthFailure::BadCredentials => "invalid_credentials",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            AuthFailure::NoToken => "Access denied. No token provided.",
            AuthFailure::BadToken => "Invalid Token, please logout and log back in to continue!",
            AuthFailure::NoRefreshToken => "Invalid credentials!",
            AuthFailure::BadRefreshToken => "Invalid token! Please log in again.",
            AuthFailure::BadCredentials => "Invalid credentials",
        }
    }

    /// Refresh failures are terminal: the client has to log in again.
    pub fn should_logout(self) -> bool {
        matches!(self, AuthFailure::NoRefreshToken | AuthFailure::BadRefreshToken)
    }
}

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthenticated: {0:?}")]
    Unauthenticated(AuthFailure),

    /// Reset token unknown or already used.
    #[error("Invalid reset token")]
    InvalidResetToken,

    #[error("Expired reset token")]
    ExpiredResetToken,

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, should_logout) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str(), false),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.as_str(), false),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str(), false),
            AppError::Unauthenticated(f) => {
                (StatusCode::UNAUTHORIZED, f.code(), f.message(), f.should_logout())
            }
            AppError::InvalidResetToken => {
                (StatusCode::BAD_REQUEST, "invalid_token", "Invalid token!", false)
            }
            AppError::ExpiredResetToken => {
                (StatusCode::BAD_REQUEST, "token_expired", "Token is expired!", false)
            }
            AppError::Internal(detail) => {
                error!(detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                    false,
                )
            }
        };
        let body = Json(ErrorResponse {
            success: false,
            error: code.to_string(),
            message: message.to_string(),
            should_logout: should_logout.then_some(true),
        });
        (status, body).into_response()
    }
}

/// Maps reset-token failures; credential-flow callers map token errors
/// themselves.
impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::CredentialError => AppError::Unauthenticated(AuthFailure::BadCredentials),
            AuthError::ValidationError(msg) => AppError::Validation(msg),
            AuthError::Conflict(_) => AppError::Conflict("Email already registered".into()),
            AuthError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            AuthError::InvalidToken => AppError::InvalidResetToken,
            AuthError::ExpiredToken => AppError::ExpiredResetToken,
            AuthError::DbError(e) => AppError::Internal(e.to_string()),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<TaskError> for AppError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::Validation(msg) => AppError::Validation(msg),
            TaskError::NotFound => AppError::NotFound("Task not found".into()),
            TaskError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}

/// Undecodable request bodies. The serde detail is logged, not returned.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "request body rejected");
        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => "Request body must be JSON",
            _ => "Invalid request body",
        };
        AppError::Validation(message.into())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        debug!(error = %rejection.body_text(), "query string rejected");
        AppError::Validation("Invalid query parameters".into())
    }
}
