use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, put},
    Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateTaskRequest, TaskQuery, UpdateTaskRequest},
    repo_types::Task,
};
use crate::{
    auth::extractors::AuthUser,
    error::{parse_id, ApiError, ApiJson},
    response::Envelope,
    state::AppState,
};

const NOT_FOUND: &str = "Task not found";

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/:id", put(update_task).delete(delete_task))
        .route("/api/tasks/:id/toggle", patch(toggle_task_status))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    Query(q): Query<TaskQuery>,
) -> Result<Envelope<Vec<Task>>, ApiError> {
    let filter = q.into_filter()?;
    let tasks = state
        .tasks
        .list(user.id, &filter)
        .await
        .map_err(ApiError::internal("Server error while fetching tasks"))?;
    Ok(Envelope::list(tasks))
}

#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<CreateTaskRequest>,
) -> Result<(StatusCode, Envelope<Task>), ApiError> {
    let new_task = body.into_new_task()?;
    let task = state
        .tasks
        .create(user.id, new_task)
        .await
        .map_err(ApiError::internal("Server error while creating task"))?;
    info!(task_id = %task.id, "task created");
    Ok((
        StatusCode::CREATED,
        Envelope::data(task).with_message("Task created successfully"),
    ))
}

#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateTaskRequest>,
) -> Result<Envelope<Task>, ApiError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let patch = body.into_patch()?;
    let task = state
        .tasks
        .update(user.id, id, patch)
        .await
        .map_err(ApiError::internal("Server error while updating task"))?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;
    Ok(Envelope::data(task).with_message("Task updated successfully"))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Envelope<()>, ApiError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let deleted = state
        .tasks
        .delete(user.id, id)
        .await
        .map_err(ApiError::internal("Server error while deleting task"))?;
    if !deleted {
        return Err(ApiError::NotFound(NOT_FOUND.into()));
    }
    info!(task_id = %id, "task deleted");
    Ok(Envelope::message("Task deleted successfully"))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn toggle_task_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Envelope<Task>, ApiError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let task = state
        .tasks
        .toggle_status(user.id, id)
        .await
        .map_err(ApiError::internal("Server error while updating task status"))?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;
    Ok(Envelope::data(task).with_message("Task status updated successfully"))
}
