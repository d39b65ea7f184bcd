use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Router,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::repo_types::UserLog;
use crate::{
    auth::extractors::AdminUser,
    error::{parse_id, ApiError},
    response::{Envelope, PageInfo},
    state::AppState,
};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;
// keeps `(page - 1) * limit` inside i64
const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

pub fn log_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/logs", get(list_logs))
        .route("/admin/logs/:id", delete(delete_log))
}

/// Raw query values; unparsable numbers fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl LogQuery {
    /// Returns `(page, limit)` with page in 1..=MAX_PAGE and limit in 1..=100.
    pub fn resolve(&self) -> (i64, i64) {
        let page = self
            .page
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_PAGE);
        let limit = self
            .limit
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);
        (page, limit)
    }
}

#[instrument(skip(state, _admin))]
pub async fn list_logs(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(q): Query<LogQuery>,
) -> Result<Envelope<Vec<UserLog>>, ApiError> {
    let (page, limit) = q.resolve();
    let logs = state
        .logs
        .page((page - 1) * limit, limit)
        .await
        .map_err(ApiError::internal("Server error while fetching user logs"))?;
    let total = state
        .logs
        .count()
        .await
        .map_err(ApiError::internal("Server error while fetching user logs"))?;

    Ok(Envelope::data(logs).with_pagination(PageInfo::new(page, limit, total)))
}

#[instrument(skip(state, admin))]
pub async fn delete_log(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Envelope<()>, ApiError> {
    let id = parse_id(&id, "User log not found")?;
    let deleted = state
        .logs
        .delete(id)
        .await
        .map_err(ApiError::internal("Server error while deleting user log"))?;
    if !deleted {
        return Err(ApiError::NotFound("User log not found".into()));
    }
    info!(log_id = %id, admin_id = %admin.id, "user log deleted");
    Ok(Envelope::message("User log deleted successfully"))
}
