//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::error::{AppError, AppResult, AuthFailure};
use crate::extract::AppJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    ForgotPasswordRequest, GoogleLoginRequest, GoogleLoginResponse, LoginRequest, LoginResponse,
    MeResponse, MessageResponse, RefreshResponse, RegisterRequest, RegisterResponse,
    ResetPasswordRequest,
};
use crate::services::auth::{self, SessionTokens};
use crate::services::cookies::{REFRESH_COOKIE, clear_refresh_cookie, refresh_cookie};

/// Put the refresh token into the cookie jar, replacing any previous one.
fn with_refresh_cookie(state: &AppState, jar: CookieJar, session: &SessionTokens) -> CookieJar {
    jar.add(refresh_cookie(
        &session.refresh_token,
        state.config.refresh_token_ttl_secs,
        state.config.cookie_secure,
    ))
}

/// `POST /api/auth/register` — create a new password account.
pub async fn register_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let user = auth::register(&state, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "New user created successfully".into(),
            user: user.into(),
        }),
    ))
}

/// `POST /api/auth/login` — authenticate with e-mail + password.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let (user, session) = auth::login(&state, body).await?;
    let jar = with_refresh_cookie(&state, jar, &session);
    Ok((
        jar,
        Json(LoginResponse {
            user: user.into(),
            token: session.access_token,
            expires_in: state.config.access_token_ttl_secs,
        }),
    ))
}

/// `POST /api/auth/google` — log in with a federated identity.
pub async fn google_login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(body): AppJson<GoogleLoginRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<GoogleLoginResponse>)> {
    let (user, is_new, session) = auth::federated_login(&state, body).await?;
    let jar = with_refresh_cookie(&state, jar, &session);
    let (status, message) = if is_new {
        (StatusCode::CREATED, "New user created successfully")
    } else {
        (StatusCode::OK, "User logged in successfully")
    };
    Ok((
        status,
        jar,
        Json(GoogleLoginResponse {
            success: true,
            message: message.into(),
            user: user.into(),
            token: session.access_token,
            expires_in: state.config.access_token_ttl_secs,
        }),
    ))
}

/// `POST /api/auth/refresh-token` — rotate the session using the refresh
/// cookie. A rejected cookie is cleared.
pub async fn refresh_handler(State(state): State<AppState>, jar: CookieJar) -> Response {
    let presented = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    match auth::refresh(&state, presented.as_deref()) {
        Ok(session) => {
            let jar = with_refresh_cookie(&state, jar, &session);
            (
                jar,
                Json(RefreshResponse {
                    token: session.access_token,
                    expires_in: state.config.access_token_ttl_secs,
                }),
            )
                .into_response()
        }
        Err(e @ AppError::Unauthenticated(AuthFailure::BadRefreshToken)) => {
            (jar.add(clear_refresh_cookie(state.config.cookie_secure)), e).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// `POST /api/auth/logout` — drop the refresh cookie.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(clear_refresh_cookie(state.config.cookie_secure)),
        Json(MessageResponse::ok("Logged out")),
    )
}

/// `POST /api/auth/forgot-password` — mail a reset link if the account exists.
pub async fn forgot_password_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    auth::forgot_password(&state, body).await?;
    Ok(Json(MessageResponse::ok("Email sent")))
}

/// `POST /api/auth/set-new-password` — redeem a reset token.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    auth::reset_password(&state, body).await?;
    Ok(Json(MessageResponse::ok("Password updated successfully")))
}

/// `GET /api/auth/me` — profile of the caller. Requires authentication.
pub async fn me_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<MeResponse>> {
    let user = auth::current_user(&state, user.subject_id()).await?;
    Ok(Json(MeResponse { user: user.into() }))
}
