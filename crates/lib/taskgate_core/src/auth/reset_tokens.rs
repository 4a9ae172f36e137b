//! Password-reset tokens.
//!
//! A random secret is handed to the caller for the e-mailed link; only its
//! SHA-256 is persisted. Tokens live for one hour and are single use: a
//! successful [`claim`] deletes the record.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::AuthError;
use crate::models::auth::ResetTokenRecord;
use crate::store::ResetTokenStore;

/// Reset token lifetime: 1 hour.
pub const RESET_TOKEN_TTL_SECS: i64 = 60 * 60;

/// 64 alphanumeric chars ≈ 381 bits of entropy.
const SECRET_LEN: usize = 64;

/// A freshly issued token. `secret` is the only redeemable copy.
#[derive(Clone)]
pub struct IssuedResetToken {
    pub secret: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedResetToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedResetToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

fn generate_secret() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LEN)
        .map(char::from)
        .collect()
}

/// SHA-256 hash a reset secret for storage and lookup.
pub fn hash_token(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Issue a token for `user_id`, expiring one hour from now.
pub async fn issue<S>(store: &S, user_id: &str) -> Result<IssuedResetToken, AuthError>
where
    S: ResetTokenStore + ?Sized,
{
    issue_at(store, user_id, Utc::now()).await
}

/// Issue a token as if at `now`.
pub async fn issue_at<S>(
    store: &S,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<IssuedResetToken, AuthError>
where
    S: ResetTokenStore + ?Sized,
{
    let secret = generate_secret();
    let expires_at = now + Duration::seconds(RESET_TOKEN_TTL_SECS);
    store
        .insert_reset_token(ResetTokenRecord {
            user_id: user_id.to_string(),
            token_hash: hash_token(&secret),
            expires_at,
        })
        .await?;
    info!(user_id, %expires_at, "password reset token issued");
    Ok(IssuedResetToken { secret, expires_at })
}

/// Look up a secret and return its user id. Does not consume the token.
pub async fn redeem<S>(store: &S, secret: &str) -> Result<String, AuthError>
where
    S: ResetTokenStore + ?Sized,
{
    redeem_at(store, secret, Utc::now()).await
}

/// Redeem against an explicit clock. Expired means `now > expires_at`;
/// a token is still valid at the exact expiry instant.
pub async fn redeem_at<S>(store: &S, secret: &str, now: DateTime<Utc>) -> Result<String, AuthError>
where
    S: ResetTokenStore + ?Sized,
{
    Ok(live_record(store, secret, now).await?.user_id)
}

async fn live_record<S>(
    store: &S,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<ResetTokenRecord, AuthError>
where
    S: ResetTokenStore + ?Sized,
{
    if secret.is_empty() {
        return Err(AuthError::InvalidToken);
    }
    let record = store
        .find_reset_token(&hash_token(secret))
        .await?
        .ok_or(AuthError::InvalidToken)?;
    if now > record.expires_at {
        debug!(user_id = %record.user_id, "expired reset token presented");
        return Err(AuthError::ExpiredToken);
    }
    Ok(record)
}

/// Invalidate a token. Returns `false` if it was already gone.
pub async fn consume<S>(store: &S, secret: &str) -> Result<bool, AuthError>
where
    S: ResetTokenStore + ?Sized,
{
    Ok(store.delete_reset_token(&hash_token(secret)).await?)
}

/// Redeem and consume in one step, returning the removed record. Of two
/// concurrent claims of the same secret only one succeeds; the other sees
/// `InvalidToken`.
pub async fn claim<S>(store: &S, secret: &str) -> Result<ResetTokenRecord, AuthError>
where
    S: ResetTokenStore + ?Sized,
{
    let record = live_record(store, secret, Utc::now()).await?;
    if !consume(store, secret).await? {
        return Err(AuthError::InvalidToken);
    }
    Ok(record)
}

/// Put a claimed record back, keeping its original expiry.
pub async fn restore<S>(store: &S, record: ResetTokenRecord) -> Result<(), AuthError>
where
    S: ResetTokenStore + ?Sized,
{
    let user_id = record.user_id.clone();
    store.insert_reset_token(record).await?;
    info!(%user_id, "password reset token restored");
    Ok(())
}

/// Delete tokens that expired before `now`.
pub async fn purge_expired<S>(store: &S, now: DateTime<Utc>) -> Result<u64, AuthError>
where
    S: ResetTokenStore + ?Sized,
{
    let removed = store.delete_expired_reset_tokens(now).await?;
    if removed > 0 {
        info!(removed, "purged expired password reset tokens");
    }
    Ok(removed)
}
