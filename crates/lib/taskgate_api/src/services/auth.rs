//! Authentication flows (registration, login, federated login, refresh and
//! password reset), delegating to `taskgate_core::auth`.

use taskgate_core::auth::credentials::{self, FederatedIdentity, Registration};
use taskgate_core::auth::reset_tokens;
use taskgate_core::auth::validation::CheckedInput;
use taskgate_core::auth::{AuthError, jwt::TokenIssuer};
use taskgate_core::models::auth::{TokenKind, User};
use taskgate_core::notify::password_reset_message;
use tracing::{debug, info, warn};

use crate::AppState;
use crate::error::{AppError, AppResult, AuthFailure};
use crate::models::{ForgotPasswordRequest, LoginRequest, ResetPasswordRequest};

/// A freshly minted access/refresh pair for one subject.
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mint a new access and refresh token for `subject_id`.
pub fn issue_session(tokens: &TokenIssuer, subject_id: &str) -> AppResult<SessionTokens> {
    Ok(SessionTokens {
        access_token: tokens.issue(subject_id, TokenKind::Access)?,
        refresh_token: tokens.issue(subject_id, TokenKind::Refresh)?,
    })
}

/// Create a password account.
pub async fn register(state: &AppState, registration: Registration) -> AppResult<User> {
    let user = credentials::register(&*state.store, &state.hasher, registration).await?;
    Ok(user)
}

/// Authenticate with e-mail + password. Unknown e-mail and wrong password
/// produce the same error.
pub async fn login(state: &AppState, body: LoginRequest) -> AppResult<(User, SessionTokens)> {
    body.check()?;
    let user =
        credentials::authenticate(&*state.store, &state.hasher, &body.email, &body.password)
            .await?;
    let session = issue_session(&state.tokens, &user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok((user, session))
}

/// Log in through an external identity, creating the account on first use.
/// Returns `(user, is_new, tokens)`.
pub async fn federated_login(
    state: &AppState,
    identity: FederatedIdentity,
) -> AppResult<(User, bool, SessionTokens)> {
    let (user, is_new) =
        credentials::upsert_federated(&*state.store, &state.hasher, identity).await?;
    let session = issue_session(&state.tokens, &user.id)?;
    info!(user_id = %user.id, is_new, "federated login");
    Ok((user, is_new, session))
}

/// Verify the refresh token from the cookie and rotate the pair.
///
/// No server-side record of issued refresh tokens exists, so a superseded
/// token keeps working until it expires.
pub fn refresh(state: &AppState, refresh_token: Option<&str>) -> AppResult<SessionTokens> {
    let token = refresh_token
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthenticated(AuthFailure::NoRefreshToken))?;

    let claims = state
        .tokens
        .verify(token, TokenKind::Refresh)
        .map_err(|e| {
            debug!(error = %e, "refresh token rejected");
            AppError::Unauthenticated(AuthFailure::BadRefreshToken)
        })?;

    let session = issue_session(&state.tokens, &claims.sub)?;
    debug!(user_id = %claims.sub, "session refreshed");
    Ok(session)
}

/// Issue a reset token and mail the link. Succeeds the same way whether or
/// not the address belongs to an account.
pub async fn forgot_password(state: &AppState, body: ForgotPasswordRequest) -> AppResult<()> {
    let body = body.normalized();
    body.check()?;

    let user = match credentials::find_by_email(&*state.store, &body.email).await {
        Ok(user) => user,
        Err(AuthError::NotFound(_)) => {
            debug!("password reset requested for unknown address");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let issued = reset_tokens::issue(&*state.store, &user.id).await?;

    // The token is already persisted; a failed delivery just lets it expire.
    let message = match password_reset_message(&state.config.app_url, &user.email, &issued.secret)
    {
        Ok(message) => message,
        Err(e) => {
            warn!(user_id = %user.id, error = %e, "could not build reset mail");
            return Ok(());
        }
    };
    if let Err(e) = state
        .mailer
        .send(&message.to, &message.subject, &message.html)
        .await
    {
        warn!(user_id = %user.id, error = %e, "reset mail delivery failed");
    }
    Ok(())
}

/// Redeem a reset token and set the new password. The token cannot be used
/// twice; it survives only if the password update fails.
pub async fn reset_password(state: &AppState, body: ResetPasswordRequest) -> AppResult<()> {
    let user_id = credentials::reset_password(&*state.store, &state.hasher, &body).await?;
    info!(user_id = %user_id, "password reset completed");
    Ok(())
}

/// Profile of the authenticated subject.
pub async fn current_user(state: &AppState, subject_id: &str) -> AppResult<User> {
    Ok(credentials::find_by_id(&*state.store, subject_id).await?)
}
