//! Authentication core.
//!
//! Password hashing, input validation, the credential store operations,
//! password-reset tokens and the access/refresh token issuer. Shared by the
//! HTTP layer in `taskgate_api`.

pub mod credentials;
pub mod jwt;
pub mod password;
pub mod reset_tokens;
pub mod validation;

use thiserror::Error;

use crate::store::StoreError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    /// First violated input rule, human readable.
    #[error("{0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Unknown, forged or already consumed token.
    #[error("Invalid token!")]
    InvalidToken,

    #[error("Token is expired!")]
    ExpiredToken,

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => AuthError::Conflict(msg),
            StoreError::Db(e) => AuthError::DbError(e),
        }
    }
}
