//! Credential store operations: registration, lookup, federated upsert,
//! password changes and password login.
//!
//! Plaintext passwords only pass through [`PasswordHasher`]; they are never
//! stored, logged or returned.

use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use super::AuthError;
use super::password::{PasswordHasher, generate_random_password};
use super::reset_tokens;
use super::validation::{CheckedInput, normalize_email, password_policy};
use crate::models::auth::{NewUser, User};
use crate::store::{ResetTokenStore, StoreError, UserStore};

/// Input for a password registration.
#[derive(Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Registration {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Please enter a valid email address")
    )]
    pub email: String,
    #[validate(custom(function = "password_policy"))]
    pub password: String,
}

impl CheckedInput for Registration {
    const FIELDS: &'static [&'static str] = &["first_name", "last_name", "email", "password"];
}

impl Registration {
    /// Trimmed names and the normalised e-mail key. Rules run on this form.
    pub fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

/// Identity asserted by an external provider.
///
/// Names are only needed when an account has to be created, so they are
/// checked separately in [`upsert_federated`].
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct FederatedIdentity {
    #[validate(length(min = 1, message = "Federated id is required"))]
    pub federated_id: String,
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Please enter a valid email address")
    )]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl CheckedInput for FederatedIdentity {
    const FIELDS: &'static [&'static str] = &["federated_id", "email"];
}

impl FederatedIdentity {
    pub fn normalized(self) -> Self {
        Self {
            federated_id: self.federated_id.trim().to_string(),
            email: normalize_email(&self.email),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
        }
    }
}

/// Names a federated identity must carry to create an account.
#[derive(Validate)]
struct NewAccountNames<'a> {
    #[validate(length(min = 1, message = "First name is required"))]
    first_name: &'a str,
    #[validate(length(min = 1, message = "Last name is required"))]
    last_name: &'a str,
}

impl CheckedInput for NewAccountNames<'_> {
    const FIELDS: &'static [&'static str] = &["first_name", "last_name"];
}

/// Validate, hash and insert a new user.
pub async fn register<S>(
    store: &S,
    hasher: &PasswordHasher,
    registration: Registration,
) -> Result<User, AuthError>
where
    S: UserStore + ?Sized,
{
    let registration = registration.normalized();
    registration.check()?;
    let Registration {
        first_name,
        last_name,
        email,
        password,
    } = registration;

    let password_hash = hasher.hash(&password).await?;
    drop(password);

    let user = store
        .insert_user(NewUser {
            email,
            first_name,
            last_name,
            password_hash,
            federated_id: None,
        })
        .await?;
    info!(user_id = %user.id, "user registered");
    Ok(user)
}

pub async fn find_by_email<S>(store: &S, email: &str) -> Result<User, AuthError>
where
    S: UserStore + ?Sized,
{
    store
        .find_user_by_email(&normalize_email(email))
        .await?
        .map(|u| u.user)
        .ok_or_else(|| AuthError::NotFound("user".into()))
}

pub async fn find_by_id<S>(store: &S, user_id: &str) -> Result<User, AuthError>
where
    S: UserStore + ?Sized,
{
    store
        .find_user_by_id(user_id)
        .await?
        .map(|u| u.user)
        .ok_or_else(|| AuthError::NotFound("user".into()))
}

/// Log in or create the account behind a federated identity.
///
/// An existing account (matched by e-mail) gets the federated id linked if it
/// has none; names and any already linked id are left untouched. A new
/// account gets an unusable random password. Returns `(user, is_new)`.
pub async fn upsert_federated<S>(
    store: &S,
    hasher: &PasswordHasher,
    identity: FederatedIdentity,
) -> Result<(User, bool), AuthError>
where
    S: UserStore + ?Sized,
{
    let identity = identity.normalized();
    identity.check()?;
    let email = identity.email.clone();

    if let Some(existing) = store.find_user_by_email(&email).await? {
        return Ok((link_existing(store, existing.user, &identity.federated_id).await?, false));
    }

    NewAccountNames {
        first_name: &identity.first_name,
        last_name: &identity.last_name,
    }
    .check()?;

    let password_hash = hasher.hash(&generate_random_password()).await?;
    let inserted = store
        .insert_user(NewUser {
            email: email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            password_hash,
            federated_id: Some(identity.federated_id.clone()),
        })
        .await;

    match inserted {
        Ok(user) => {
            info!(user_id = %user.id, "federated user created");
            Ok((user, true))
        }
        // Lost a race with a concurrent first login for the same e-mail.
        Err(StoreError::Conflict(_)) => {
            let existing = store
                .find_user_by_email(&email)
                .await?
                .ok_or_else(|| AuthError::Internal("user vanished after conflict".into()))?;
            Ok((link_existing(store, existing.user, &identity.federated_id).await?, false))
        }
        Err(e) => Err(e.into()),
    }
}

async fn link_existing<S>(store: &S, user: User, federated_id: &str) -> Result<User, AuthError>
where
    S: UserStore + ?Sized,
{
    match &user.federated_id {
        None => {
            let linked = store
                .link_federated_id(&user.id, federated_id)
                .await?
                .ok_or_else(|| AuthError::NotFound("user".into()))?;
            info!(user_id = %linked.id, "federated id linked");
            Ok(linked)
        }
        Some(current) if current != federated_id => {
            warn!(user_id = %user.id, "federated login with a different provider id; keeping the linked one");
            Ok(user)
        }
        Some(_) => Ok(user),
    }
}

/// Re-hash and replace a user's password.
pub async fn set_password<S>(
    store: &S,
    hasher: &PasswordHasher,
    user_id: &str,
    new_password: &str,
) -> Result<(), AuthError>
where
    S: UserStore + ?Sized,
{
    let password_hash = hasher.hash(new_password).await?;
    if !store.update_password_hash(user_id, &password_hash).await? {
        return Err(AuthError::NotFound("user".into()));
    }
    info!(user_id, "password updated");
    Ok(())
}

/// Input for completing a password reset.
#[derive(Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PasswordReset {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    #[validate(custom(function = "password_policy"))]
    pub password: String,
}

impl CheckedInput for PasswordReset {
    const FIELDS: &'static [&'static str] = &["token", "password"];
}

/// Redeem a reset secret and set the new password. Returns the user id.
///
/// The token is claimed before the password changes, so only one of two
/// concurrent resets proceeds. If the password update then fails the token
/// is put back and can be used again.
pub async fn reset_password<S>(
    store: &S,
    hasher: &PasswordHasher,
    reset: &PasswordReset,
) -> Result<String, AuthError>
where
    S: UserStore + ResetTokenStore + ?Sized,
{
    reset.check()?;
    let record = reset_tokens::claim(store, &reset.token).await?;
    if let Err(e) = set_password(store, hasher, &record.user_id, &reset.password).await {
        let user_id = record.user_id.clone();
        if let Err(restore) = reset_tokens::restore(store, record).await {
            warn!(%user_id, error = %restore, "could not restore reset token");
        }
        return Err(e);
    }
    Ok(record.user_id)
}

/// Check an e-mail/password pair. Unknown e-mail and wrong password fail
/// the same way.
pub async fn authenticate<S>(
    store: &S,
    hasher: &PasswordHasher,
    email: &str,
    password: &str,
) -> Result<User, AuthError>
where
    S: UserStore + ?Sized,
{
    let Some(found) = store.find_user_by_email(&normalize_email(email)).await? else {
        hasher.verify_dummy(password).await;
        return Err(AuthError::CredentialError);
    };
    if !hasher.verify(password, &found.password_hash).await? {
        return Err(AuthError::CredentialError);
    }
    Ok(found.user)
}
