//! Per-user task list.
//!
//! Every operation takes the authenticated subject id; another user's task
//! is indistinguishable from a missing one.

use thiserror::Error;
use tracing::info;

use crate::models::task::{Task, TaskPage};
use crate::store::{StoreError, TaskStore};

/// Page size when none is requested.
pub const DEFAULT_PAGE_LIMIT: u32 = 5;

/// Upper bound on the page size.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Task errors.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    Validation(String),

    #[error("Task not found")]
    NotFound,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// One page of `user_id`'s tasks. Page numbers start at 1.
pub async fn list_tasks<S>(
    store: &S,
    user_id: &str,
    page: Option<u32>,
    limit: Option<u32>,
) -> Result<TaskPage, TaskError>
where
    S: TaskStore + ?Sized,
{
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let offset = u64::from(page - 1) * u64::from(limit);

    let tasks = store
        .list_tasks(user_id, offset, u64::from(limit))
        .await?;
    let total = store.count_tasks(user_id).await?;
    Ok(TaskPage {
        tasks,
        page,
        limit,
        total,
    })
}

pub async fn create_task<S>(store: &S, user_id: &str, name: &str) -> Result<Task, TaskError>
where
    S: TaskStore + ?Sized,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(TaskError::Validation("Task name is required".into()));
    }
    let task = store.insert_task(user_id, name).await?;
    info!(user_id, task_id = %task.id, "task created");
    Ok(task)
}

pub async fn set_task_status<S>(
    store: &S,
    user_id: &str,
    task_id: &str,
    status: bool,
) -> Result<Task, TaskError>
where
    S: TaskStore + ?Sized,
{
    store
        .update_task_status(user_id, task_id, status)
        .await?
        .ok_or(TaskError::NotFound)
}

pub async fn delete_task<S>(store: &S, user_id: &str, task_id: &str) -> Result<(), TaskError>
where
    S: TaskStore + ?Sized,
{
    if !store.delete_task(user_id, task_id).await? {
        return Err(TaskError::NotFound);
    }
    info!(user_id, task_id, "task deleted");
    Ok(())
}
