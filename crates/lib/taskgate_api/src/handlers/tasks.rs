//! Task list request handlers. All routes sit behind `require_auth` and
//! act only on the caller's own tasks.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use taskgate_core::tasks;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::{AppJson, AppQuery};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    CreateTaskRequest, MessageResponse, TaskListQuery, TaskListResponse, TaskResponse,
    UpdateTaskRequest,
};

/// `GET /api/tasks` — one page of the caller's tasks.
pub async fn list_tasks_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    AppQuery(query): AppQuery<TaskListQuery>,
) -> AppResult<Json<TaskListResponse>> {
    let page =
        tasks::list_tasks(&*state.store, user.subject_id(), query.page, query.limit).await?;
    let pages = page.pages();
    Ok(Json(TaskListResponse {
        success: true,
        tasks: page.tasks.into_iter().map(Into::into).collect(),
        page: page.page,
        limit: page.limit,
        total: page.total,
        pages,
    }))
}

/// `POST /api/tasks` — add a task.
pub async fn create_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    AppJson(body): AppJson<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<TaskResponse>)> {
    let task = tasks::create_task(&*state.store, user.subject_id(), &body.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            success: true,
            message: "New task created successfully".into(),
            task: task.into(),
        }),
    ))
}

/// `PATCH /api/tasks/{id}` — mark a task done or not done.
pub async fn update_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(task_id): Path<String>,
    AppJson(body): AppJson<UpdateTaskRequest>,
) -> AppResult<Json<TaskResponse>> {
    let task =
        tasks::set_task_status(&*state.store, user.subject_id(), &task_id, body.status).await?;
    Ok(Json(TaskResponse {
        success: true,
        message: "Task updated successfully".into(),
        task: task.into(),
    }))
}

/// `DELETE /api/tasks/{id}` — remove a task.
pub async fn delete_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(task_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    tasks::delete_task(&*state.store, user.subject_id(), &task_id).await?;
    Ok(Json(MessageResponse::ok("Task deleted successfully")))
}
