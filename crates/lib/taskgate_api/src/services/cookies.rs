//! Refresh-token cookie.
//!
//! The refresh token never appears in a response body or request header; it
//! only travels in this httpOnly, `SameSite=None` cookie scoped to the auth
//! routes.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Cookie path: only the auth routes ever see the refresh token.
pub const REFRESH_COOKIE_PATH: &str = "/api/auth";

/// Build the refresh cookie, living as long as the token.
pub fn refresh_cookie(token: &str, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::None)
        .path(REFRESH_COOKIE_PATH)
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

/// Build an expired refresh cookie to clear session state.
pub fn clear_refresh_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, String::new()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::None)
        .path(REFRESH_COOKIE_PATH)
        .max_age(Duration::ZERO)
        .build()
}
