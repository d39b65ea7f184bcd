use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "log_action", rename_all = "lowercase")]
pub enum LogAction {
    Login,
    Logout,
}

/// One login or logout audit row.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub role: Role,
    pub action: LogAction,
    #[serde(with = "time::serde::rfc3339::option")]
    pub login_time: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub logout_time: Option<OffsetDateTime>,
    pub token_id: String,
    pub ip_address: String,
    pub user_agent: String,
    pub session_duration: Option<i64>, // minutes, logout rows only
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUserLog {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub role: Role,
    pub action: LogAction,
    pub login_time: Option<OffsetDateTime>,
    pub logout_time: Option<OffsetDateTime>,
    pub token_id: String,
    pub ip_address: String,
    pub user_agent: String,
    pub session_duration: Option<i64>,
}
