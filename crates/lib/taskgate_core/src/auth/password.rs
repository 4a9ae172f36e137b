//! Password hashing via bcrypt.
//!
//! The salt is embedded in the stored hash. Hashing is CPU bound, so the
//! async entry points run it on the blocking pool.

use std::sync::{Arc, OnceLock};

use rand::distr::Alphanumeric;
use rand::{Rng, rng};

use super::AuthError;

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// bcrypt's accepted cost range.
const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// Hash a password with bcrypt at the given cost.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")))
}

/// Random password for accounts created through federated login.
/// Nobody knows it, so the account cannot log in with a password until reset.
pub fn generate_random_password() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Bcrypt hasher with a fixed work factor.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    /// Hash of an unknown random password at `cost`, made on first use.
    dummy: Arc<OnceLock<String>>,
}

impl PasswordHasher {
    /// Costs outside bcrypt's 4..=31 range are clamped.
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_COST, MAX_COST),
            dummy: Arc::new(OnceLock::new()),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let cost = self.cost;
        let plaintext = plaintext.to_owned();
        tokio::task::spawn_blocking(move || hash_password(&plaintext, cost))
            .await
            .map_err(|e| AuthError::Internal(format!("hash task: {e}")))?
    }

    pub async fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, AuthError> {
        let plaintext = plaintext.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || verify_password(&plaintext, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("verify task: {e}")))?
    }

    /// Spend one verification at this hasher's cost on a hash nobody can
    /// match. Lets a login for an unknown account take as long as one with
    /// a wrong password.
    pub async fn verify_dummy(&self, plaintext: &str) {
        let cost = self.cost;
        let dummy = self.dummy.clone();
        let plaintext = plaintext.to_owned();
        let _ = tokio::task::spawn_blocking(move || {
            let hash = dummy.get_or_init(|| {
                hash_password(&generate_random_password(), cost).unwrap_or_default()
            });
            verify_password(&plaintext, hash)
        })
        .await;
    }

    /// Whether [`verify_dummy`](Self::verify_dummy) has run on this hasher
    /// or one of its clones.
    pub fn dummy_used(&self) -> bool {
        self.dummy.get().is_some()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}
