//! PostgreSQL store.
//!
//! Schema lives in `migrations/`. E-mail uniqueness is a unique index on
//! `lower(email)`, token-hash uniqueness a unique constraint; violations are
//! reported as [`StoreError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ResetTokenStore, StoreError, TaskStore, UserStore};
use crate::models::auth::{NewUser, ResetTokenRecord, User, UserWithPassword};
use crate::models::task::Task;
use crate::uuid::uuidv7;

type UserRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    DateTime<Utc>,
    String,
);

type TaskRow = (String, String, String, bool, DateTime<Utc>);

const USER_COLUMNS: &str =
    "id::text, email, first_name, last_name, federated_id, created_at, password_hash";

const TASK_COLUMNS: &str = "id::text, user_id::text, name, status, created_at";

fn user_from_row(row: UserRow) -> UserWithPassword {
    let (id, email, first_name, last_name, federated_id, created_at, password_hash) = row;
    UserWithPassword {
        user: User {
            id,
            email,
            first_name,
            last_name,
            federated_id,
            created_at,
        },
        password_hash,
    }
}

fn task_from_row(row: TaskRow) -> Task {
    let (id, user_id, name, status, created_at) = row;
    Task {
        id,
        user_id,
        name,
        status,
        created_at,
    }
}

/// Map unique-constraint violations to `Conflict`, everything else to `Db`.
fn conflict_or_db(e: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &e
        && db.is_unique_violation()
    {
        return StoreError::Conflict(what.to_string());
    }
    StoreError::Db(e)
}

/// Ids arrive as text from tokens and paths; anything that is not a UUID
/// cannot match a row.
fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

/// Store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (email, first_name, last_name, password_hash, federated_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.password_hash)
        .bind(&new_user.federated_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_db(e, "email already registered"))?;
        Ok(user_from_row(row).user)
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserWithPassword>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<UserWithPassword>, StoreError> {
        let Some(id) = parse_id(user_id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    async fn link_federated_id(
        &self,
        user_id: &str,
        federated_id: &str,
    ) -> Result<Option<User>, StoreError> {
        let Some(id) = parse_id(user_id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET federated_id = COALESCE(federated_id, $2), updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(federated_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| user_from_row(r).user))
    }

    async fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let Some(id) = parse_id(user_id) else {
            return Ok(false);
        };
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ResetTokenStore for PgStore {
    async fn insert_reset_token(&self, record: ResetTokenRecord) -> Result<(), StoreError> {
        let Some(user_id) = parse_id(&record.user_id) else {
            return Err(StoreError::Db(sqlx::Error::RowNotFound));
        };
        sqlx::query(
            "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at) \
             VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(&record.token_hash)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_db(e, "reset token hash collision"))?;
        Ok(())
    }

    async fn find_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<ResetTokenRecord>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
            "SELECT user_id::text, token_hash, expires_at \
             FROM password_reset_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(user_id, token_hash, expires_at)| ResetTokenRecord {
            user_id,
            token_hash,
            expires_at,
        }))
    }

    async fn delete_reset_token(&self, token_hash: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM password_reset_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, user_id: &str, name: &str) -> Result<Task, StoreError> {
        let Some(owner) = parse_id(user_id) else {
            return Err(StoreError::Db(sqlx::Error::RowNotFound));
        };
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "INSERT INTO tasks (id, user_id, name) VALUES ($1, $2, $3) RETURNING {TASK_COLUMNS}"
        ))
        .bind(uuidv7())
        .bind(owner)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(task_from_row(row))
    }

    async fn list_tasks(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Task>, StoreError> {
        let Some(owner) = parse_id(user_id) else {
            return Ok(Vec::new());
        };
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1 ORDER BY id OFFSET $2 LIMIT $3"
        ))
        .bind(owner)
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(task_from_row).collect())
    }

    async fn count_tasks(&self, user_id: &str) -> Result<u64, StoreError> {
        let Some(owner) = parse_id(user_id) else {
            return Ok(0);
        };
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn update_task_status(
        &self,
        user_id: &str,
        task_id: &str,
        status: bool,
    ) -> Result<Option<Task>, StoreError> {
        let (Some(owner), Some(id)) = (parse_id(user_id), parse_id(task_id)) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "UPDATE tasks SET status = $3, updated_at = now() \
             WHERE id = $1 AND user_id = $2 RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(owner)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(task_from_row))
    }

    async fn delete_task(&self, user_id: &str, task_id: &str) -> Result<bool, StoreError> {
        let (Some(owner), Some(id)) = (parse_id(user_id), parse_id(task_id)) else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
