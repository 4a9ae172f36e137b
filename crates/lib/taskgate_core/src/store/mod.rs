//! Persistence seams.
//!
//! Every store operation is async and only suspends the calling request.
//! Uniqueness (user e-mail, reset-token hash) is enforced by the backend with
//! an atomic check-and-insert; a duplicate insert fails with
//! [`StoreError::Conflict`] instead of overwriting.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::auth::{NewUser, ResetTokenRecord, User, UserWithPassword};
use crate::models::task::Task;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// User records. The e-mail key passed in is expected to be normalised.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `Conflict` if the e-mail is taken.
    async fn insert_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_email(&self, email: &str)
    -> Result<Option<UserWithPassword>, StoreError>;

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<UserWithPassword>, StoreError>;

    /// Set the federated id only if none is linked yet. Returns the user as stored.
    async fn link_federated_id(
        &self,
        user_id: &str,
        federated_id: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Replace the password hash. Returns `false` if the user does not exist.
    async fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError>;
}

/// Password-reset token records, keyed by token hash.
#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    /// Insert a record. Fails with `Conflict` if the hash already exists.
    async fn insert_reset_token(&self, record: ResetTokenRecord) -> Result<(), StoreError>;

    async fn find_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<ResetTokenRecord>, StoreError>;

    /// Remove a record. Returns `false` if it was already gone.
    async fn delete_reset_token(&self, token_hash: &str) -> Result<bool, StoreError>;

    /// Remove every record with `expires_at < now`. Returns the number removed.
    async fn delete_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Task records. Every operation is scoped by the owning user id.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, user_id: &str, name: &str) -> Result<Task, StoreError>;

    /// Tasks of `user_id`, oldest first.
    async fn list_tasks(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Task>, StoreError>;

    async fn count_tasks(&self, user_id: &str) -> Result<u64, StoreError>;

    /// Returns `None` when no task with that id belongs to `user_id`.
    async fn update_task_status(
        &self,
        user_id: &str,
        task_id: &str,
        status: bool,
    ) -> Result<Option<Task>, StoreError>;

    async fn delete_task(&self, user_id: &str, task_id: &str) -> Result<bool, StoreError>;
}

/// Everything the application needs from a backend.
pub trait Store: UserStore + ResetTokenStore + TaskStore {}

impl<T: UserStore + ResetTokenStore + TaskStore> Store for T {}
