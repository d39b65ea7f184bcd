use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use tracing::{info, instrument};

use super::dto::{UpdateUserRequest, UserStats};
use crate::{
    auth::{
        dto::{PublicUser, RegisterRequest},
        extractors::AdminUser,
        repo_types::{Role, User},
        services::{create_account, normalize_email},
    },
    error::{ApiError, ApiJson},
    response::Envelope,
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/create-admin", post(create_admin))
        .route("/admin/admins", get(list_admins))
        .route("/admin/stats", get(stats))
        .route("/admin/users", get(list_users))
        .route("/admin/users/:email", put(update_user).delete(delete_user))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.id))]
pub async fn create_admin(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Envelope<PublicUser>), ApiError> {
    let created = create_account(&state, payload, Role::Admin).await?;
    info!(new_admin_id = %created.id, "admin created");
    Ok((
        StatusCode::CREATED,
        Envelope::data(created.into()).with_message("Admin created successfully"),
    ))
}

#[instrument(skip(state, _admin))]
pub async fn list_admins(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Envelope<Vec<User>>, ApiError> {
    let admins = state
        .users
        .list(Some(Role::Admin))
        .await
        .map_err(ApiError::internal("Server error while fetching admins"))?;
    Ok(Envelope::list(admins))
}

#[instrument(skip(state, _admin))]
pub async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Envelope<UserStats>, ApiError> {
    let total_users = state
        .users
        .count_by_role(Role::User)
        .await
        .map_err(ApiError::internal("Server error while fetching stats"))?;
    let total_admins = state
        .users
        .count_by_role(Role::Admin)
        .await
        .map_err(ApiError::internal("Server error while fetching stats"))?;
    Ok(Envelope::data(UserStats {
        total_users,
        total_admins,
        total_all_users: total_users + total_admins,
    }))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Envelope<Vec<User>>, ApiError> {
    let users = state
        .users
        .list(None)
        .await
        .map_err(ApiError::internal("Server error while fetching users"))?;
    Ok(Envelope::list(users))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(email): Path<String>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<Envelope<User>, ApiError> {
    let patch = body.into_patch()?;
    let user = state
        .users
        .update_by_email(&normalize_email(&email), patch)
        .await
        .map_err(ApiError::internal("Failed to update user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    info!(user_id = %user.id, role = %user.role, "user updated");
    Ok(Envelope::data(user).with_message("User updated successfully"))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(email): Path<String>,
) -> Result<Envelope<()>, ApiError> {
    let email = normalize_email(&email);
    let deleted = state
        .users
        .delete_by_email(&email)
        .await
        .map_err(ApiError::internal("Failed to delete user"))?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".into()));
    }
    info!(email = %email, "user deleted");
    Ok(Envelope::message("User deleted successfully"))
}
