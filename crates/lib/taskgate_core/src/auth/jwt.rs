//! JWT token generation and verification.
//!
//! Access and refresh tokens are HS256 JWTs signed with two independent
//! secrets, so a leaked access secret cannot forge refresh tokens. The
//! token class is also carried in the `typ` claim and checked on verify.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{debug, info};

use super::AuthError;
use crate::models::auth::{TokenClaims, TokenKind};
use crate::uuid::uuidv4;

/// Access token lifetime: 15 minutes.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Refresh token lifetime: 1 day.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Clone)]
struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKey {
    fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

/// Mints and verifies access/refresh tokens. Holds no per-token state.
#[derive(Clone)]
pub struct TokenIssuer {
    access: SigningKey,
    refresh: SigningKey,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access.ttl)
            .field("refresh_ttl", &self.refresh.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Build an issuer. The two secrets must be non-empty and distinct.
    pub fn new(
        access_secret: &[u8],
        refresh_secret: &[u8],
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, AuthError> {
        if access_secret.is_empty() || refresh_secret.is_empty() {
            return Err(AuthError::Internal("token secrets must not be empty".into()));
        }
        if access_secret == refresh_secret {
            return Err(AuthError::Internal(
                "access and refresh token secrets must differ".into(),
            ));
        }
        Ok(Self {
            access: SigningKey::new(access_secret, access_ttl),
            refresh: SigningKey::new(refresh_secret, refresh_ttl),
        })
    }

    /// Issuer with the default lifetimes (15 min access, 1 day refresh).
    pub fn with_default_ttls(access_secret: &[u8], refresh_secret: &[u8]) -> Result<Self, AuthError> {
        Self::new(
            access_secret,
            refresh_secret,
            Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            Duration::seconds(REFRESH_TOKEN_TTL_SECS),
        )
    }

    fn key(&self, kind: TokenKind) -> &SigningKey {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        self.key(kind).ttl
    }

    /// Sign a token of class `kind` for `subject_id`, valid from now.
    pub fn issue(&self, subject_id: &str, kind: TokenKind) -> Result<String, AuthError> {
        self.issue_at(subject_id, kind, Utc::now())
    }

    /// Sign a token as if issued at `now`.
    pub fn issue_at(
        &self,
        subject_id: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let key = self.key(kind);
        let claims = TokenClaims {
            sub: subject_id.to_string(),
            typ: kind,
            jti: uuidv4().to_string(),
            exp: (now + key.ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &key.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Verify signature, expiry and class. Errors carry no detail beyond
    /// invalid vs expired.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, AuthError> {
        let key = self.key(kind);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<TokenClaims>(token, &key.decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                other => {
                    debug!(kind = kind.as_str(), error = ?other, "token rejected");
                    AuthError::InvalidToken
                }
            })?
            .claims;

        if claims.typ != kind {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}

/// Resolve a signing secret: env var `env_var` → persisted file `file_name`
/// under the app data dir → freshly generated (and persisted) secret.
pub fn resolve_secret(env_var: &str, file_name: &str) -> String {
    if let Ok(secret) = std::env::var(env_var)
        && !secret.is_empty()
    {
        return secret;
    }
    let secret_path = secret_path(file_name);
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), env_var, "generated new signing secret");
    secret
}

/// Path to a persisted secret file.
fn secret_path(file_name: &str) -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskgate")
        .join(file_name)
}
