use anyhow::Context;
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::repo_types::{NewTask, Task, TaskFilter, TaskPatch};
use crate::db::PgStore;

/// Task storage. Every call is scoped to the owning user; a task owned by
/// someone else is indistinguishable from a missing one.
#[async_trait]
pub trait TaskRepo: Send + Sync {
    async fn list(&self, owner: Uuid, filter: &TaskFilter) -> anyhow::Result<Vec<Task>>;
    async fn create(&self, owner: Uuid, task: NewTask) -> anyhow::Result<Task>;
    async fn update(&self, owner: Uuid, id: Uuid, patch: TaskPatch) -> anyhow::Result<Option<Task>>;
    async fn toggle_status(&self, owner: Uuid, id: Uuid) -> anyhow::Result<Option<Task>>;
    async fn delete(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool>;
}

const TASK_COLUMNS: &str =
    "id, user_id, title, description, status, priority, due_date, created_at, updated_at";

#[async_trait]
impl TaskRepo for PgStore {
    async fn list(&self, owner: Uuid, filter: &TaskFilter) -> anyhow::Result<Vec<Task>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = "));
        qb.push_bind(owner);
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(priority) = filter.priority {
            qb.push(" AND priority = ").push_bind(priority);
        }
        // column and direction come from closed enums, never from raw input
        qb.push(format!(
            " ORDER BY {} {}, id ASC",
            filter.sort_by.column(),
            filter.order.sql()
        ));

        let rows = qb
            .build_query_as::<Task>()
            .fetch_all(&self.pool)
            .await
            .context("list tasks")?;
        Ok(rows)
    }

    async fn create(&self, owner: Uuid, task: NewTask) -> anyhow::Result<Task> {
        let row = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (id, user_id, title, description, status, priority, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.due_date)
        .fetch_one(&self.pool)
        .await
        .context("insert task")?;
        Ok(row)
    }

    async fn update(&self, owner: Uuid, id: Uuid, patch: TaskPatch) -> anyhow::Result<Option<Task>> {
        let row = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
               SET title = COALESCE($3, title),
                   description = COALESCE($4, description),
                   status = COALESCE($5, status),
                   priority = COALESCE($6, priority),
                   due_date = COALESCE($7, due_date),
                   updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.status)
        .bind(patch.priority)
        .bind(patch.due_date)
        .fetch_optional(&self.pool)
        .await
        .context("update task")?;
        Ok(row)
    }

    async fn toggle_status(&self, owner: Uuid, id: Uuid) -> anyhow::Result<Option<Task>> {
        let row = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
               SET status = CASE status
                              WHEN 'complete' THEN 'incomplete'::task_status
                              ELSE 'complete'::task_status
                            END,
                   updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .context("toggle task status")?;
        Ok(row)
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .context("delete task")?;
        Ok(res.rows_affected() > 0)
    }
}
