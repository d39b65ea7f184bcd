use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, Role, User, UserPatch};
use crate::db::{is_unique_violation, PgStore};

/// Persistence operations over the users table.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Returns `None` when the email is already taken.
    async fn create(&self, user: NewUser) -> anyhow::Result<Option<User>>;
    /// All users, or only those with `role` when given. Oldest first.
    async fn list(&self, role: Option<Role>) -> anyhow::Result<Vec<User>>;
    async fn count_by_role(&self, role: Role) -> anyhow::Result<i64>;
    async fn update_by_email(&self, email: &str, patch: UserPatch) -> anyhow::Result<Option<User>>;
    async fn delete_by_email(&self, email: &str) -> anyhow::Result<bool>;
}

const USER_COLUMNS: &str = "id, email, password_hash, full_name, role, created_at, updated_at";

#[async_trait]
impl UserRepo for PgStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        let res = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await;

        match res {
            Ok(u) => Ok(Some(u)),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(anyhow::Error::new(e).context("insert user")),
        }
    }

    async fn list(&self, role: Option<Role>) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
              FROM users
             WHERE $1::user_role IS NULL OR role = $1
             ORDER BY created_at ASC
            "#
        ))
        .bind(role)
        .fetch_all(&self.pool)
        .await
        .context("list users")?;
        Ok(users)
    }

    async fn count_by_role(&self, role: Role) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await
            .context("count users by role")?;
        Ok(count)
    }

    async fn update_by_email(&self, email: &str, patch: UserPatch) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET full_name = COALESCE($2, full_name),
                   role = COALESCE($3, role),
                   updated_at = now()
             WHERE email = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(patch.full_name)
        .bind(patch.role)
        .fetch_optional(&self.pool)
        .await
        .context("update user by email")?;
        Ok(user)
    }

    async fn delete_by_email(&self, email: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await
            .context("delete user by email")?;
        Ok(res.rows_affected() > 0)
    }
}
