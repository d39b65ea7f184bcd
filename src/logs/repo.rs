use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{NewUserLog, UserLog};
use crate::db::PgStore;

/// Append-only audit storage.
#[async_trait]
pub trait LogRepo: Send + Sync {
    async fn insert(&self, log: NewUserLog) -> anyhow::Result<UserLog>;
    /// Newest login row for this user and token id.
    async fn latest_login(&self, user_id: Uuid, token_id: &str) -> anyhow::Result<Option<UserLog>>;
    /// Newest first; equal timestamps fall back to id, descending.
    async fn page(&self, offset: i64, limit: i64) -> anyhow::Result<Vec<UserLog>>;
    async fn count(&self) -> anyhow::Result<i64>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

const LOG_COLUMNS: &str = "id, user_id, user_name, user_email, role, action, login_time, \
     logout_time, token_id, ip_address, user_agent, session_duration, created_at";

#[async_trait]
impl LogRepo for PgStore {
    async fn insert(&self, log: NewUserLog) -> anyhow::Result<UserLog> {
        let row = sqlx::query_as::<_, UserLog>(&format!(
            r#"
            INSERT INTO user_logs (id, user_id, user_name, user_email, role, action,
                                   login_time, logout_time, token_id, ip_address,
                                   user_agent, session_duration)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {LOG_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(log.user_id)
        .bind(&log.user_name)
        .bind(&log.user_email)
        .bind(log.role)
        .bind(log.action)
        .bind(log.login_time)
        .bind(log.logout_time)
        .bind(&log.token_id)
        .bind(&log.ip_address)
        .bind(&log.user_agent)
        .bind(log.session_duration)
        .fetch_one(&self.pool)
        .await
        .context("insert user log")?;
        Ok(row)
    }

    async fn latest_login(&self, user_id: Uuid, token_id: &str) -> anyhow::Result<Option<UserLog>> {
        let row = sqlx::query_as::<_, UserLog>(&format!(
            r#"
            SELECT {LOG_COLUMNS}
              FROM user_logs
             WHERE user_id = $1 AND token_id = $2 AND action = 'login'
             ORDER BY created_at DESC, id DESC
             LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await
        .context("find latest login log")?;
        Ok(row)
    }

    async fn page(&self, offset: i64, limit: i64) -> anyhow::Result<Vec<UserLog>> {
        let rows = sqlx::query_as::<_, UserLog>(&format!(
            r#"
            SELECT {LOG_COLUMNS}
              FROM user_logs
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("list user logs")?;
        Ok(rows)
    }

    async fn count(&self) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_logs")
            .fetch_one(&self.pool)
            .await
            .context("count user logs")?;
        Ok(count)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM user_logs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete user log")?;
        Ok(res.rows_affected() > 0)
    }
}
