//! Authentication middleware: Bearer token extraction and access-token
//! verification.
//!
//! Only establishes *who* is calling. Which records the subject may touch is
//! decided by each handler.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use taskgate_core::models::auth::{TokenClaims, TokenKind};
use tracing::debug;

use crate::AppState;
use crate::error::{AppError, AuthFailure};

/// Verified identity, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub TokenClaims);

impl AuthenticatedUser {
    /// The subject (user id) the access token was issued for.
    pub fn subject_id(&self) -> &str {
        &self.0.sub
    }
}

/// Extract the token from an `Authorization` header value.
///
/// `Ok(None)` means the header carries no token at all (e.g. `"Bearer"`),
/// `Err` means it uses another scheme.
fn bearer_token(value: &str) -> Result<Option<&str>, AuthFailure> {
    let value = value.trim();
    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthFailure::BadToken);
    }
    let token = token.trim();
    Ok((!token.is_empty()).then_some(token))
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies it as
/// an access token, and injects `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AppError::Unauthenticated(AuthFailure::NoToken))?
        .to_str()
        .map_err(|_| AppError::Unauthenticated(AuthFailure::BadToken))?;

    let token = bearer_token(header)
        .map_err(AppError::Unauthenticated)?
        .ok_or(AppError::Unauthenticated(AuthFailure::NoToken))?;

    let claims = state
        .tokens
        .verify(token, TokenKind::Access)
        .map_err(|e| {
            debug!(error = %e, "access token rejected");
            AppError::Unauthenticated(AuthFailure::BadToken)
        })?;

    request.extensions_mut().insert(AuthenticatedUser(claims));

    Ok(next.run(request).await)
}
