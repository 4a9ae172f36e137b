//! In-memory store backed by `DashMap`.
//!
//! Used by tests and local development. Uniqueness is enforced through the
//! map entry API, which locks the shard for the duration of the insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{ResetTokenStore, StoreError, TaskStore, UserStore};
use crate::models::auth::{NewUser, ResetTokenRecord, User, UserWithPassword};
use crate::models::task::Task;
use crate::uuid::{uuidv4, uuidv7};

/// Process-local store. Cheap to construct; wrap in an `Arc` to share.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, UserWithPassword>,
    /// Normalised e-mail → user id.
    emails: DashMap<String, String>,
    reset_tokens: DashMap<String, ResetTokenRecord>,
    tasks: DashMap<String, Task>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reset-token records currently stored.
    pub fn reset_token_count(&self) -> usize {
        self.reset_tokens.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        match self.emails.entry(new_user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "email '{}' already registered",
                new_user.email
            ))),
            Entry::Vacant(slot) => {
                let user = User {
                    id: uuidv4().to_string(),
                    email: new_user.email,
                    first_name: new_user.first_name,
                    last_name: new_user.last_name,
                    federated_id: new_user.federated_id,
                    created_at: Utc::now(),
                };
                self.users.insert(
                    user.id.clone(),
                    UserWithPassword {
                        user: user.clone(),
                        password_hash: new_user.password_hash,
                    },
                );
                slot.insert(user.id.clone());
                Ok(user)
            }
        }
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserWithPassword>, StoreError> {
        let Some(user_id) = self.emails.get(email).map(|id| id.clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<UserWithPassword>, StoreError> {
        Ok(self.users.get(user_id).map(|u| u.clone()))
    }

    async fn link_federated_id(
        &self,
        user_id: &str,
        federated_id: &str,
    ) -> Result<Option<User>, StoreError> {
        let Some(mut entry) = self.users.get_mut(user_id) else {
            return Ok(None);
        };
        if entry.user.federated_id.is_none() {
            entry.user.federated_id = Some(federated_id.to_string());
        }
        Ok(Some(entry.user.clone()))
    }

    async fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        match self.users.get_mut(user_id) {
            Some(mut entry) => {
                entry.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ResetTokenStore for MemoryStore {
    async fn insert_reset_token(&self, record: ResetTokenRecord) -> Result<(), StoreError> {
        match self.reset_tokens.entry(record.token_hash.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict("reset token hash collision".into())),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn find_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<ResetTokenRecord>, StoreError> {
        Ok(self.reset_tokens.get(token_hash).map(|r| r.clone()))
    }

    async fn delete_reset_token(&self, token_hash: &str) -> Result<bool, StoreError> {
        Ok(self.reset_tokens.remove(token_hash).is_some())
    }

    async fn delete_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let expired: Vec<String> = self
            .reset_tokens
            .iter()
            .filter(|r| r.expires_at < now)
            .map(|r| r.key().clone())
            .collect();
        let mut removed = 0;
        for key in expired {
            if self
                .reset_tokens
                .remove_if(&key, |_, r| r.expires_at < now)
                .is_some()
            {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, user_id: &str, name: &str) -> Result<Task, StoreError> {
        let task = Task {
            id: uuidv7().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            status: false,
            created_at: Utc::now(),
        };
        self.tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn list_tasks(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Task>, StoreError> {
        let mut owned: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.clone())
            .collect();
        // UUIDv7 ids sort by creation time.
        owned.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(owned
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn count_tasks(&self, user_id: &str) -> Result<u64, StoreError> {
        Ok(self.tasks.iter().filter(|t| t.user_id == user_id).count() as u64)
    }

    async fn update_task_status(
        &self,
        user_id: &str,
        task_id: &str,
        status: bool,
    ) -> Result<Option<Task>, StoreError> {
        match self.tasks.get_mut(task_id) {
            Some(mut task) if task.user_id == user_id => {
                task.status = status;
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_task(&self, user_id: &str, task_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .tasks
            .remove_if(task_id, |_, t| t.user_id == user_id)
            .is_some())
    }
}
