//! In-process repositories for tests.

use std::{cmp::Ordering, sync::Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserRepo,
        repo_types::{NewUser, Role, User, UserPatch},
    },
    logs::{
        repo::LogRepo,
        repo_types::{LogAction, NewUserLog, UserLog},
    },
    tasks::{
        repo::TaskRepo,
        repo_types::{NewTask, SortField, SortOrder, Task, TaskFilter, TaskPatch},
    },
};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    tasks: Mutex<Vec<Task>>,
    logs: Mutex<Vec<UserLog>>,
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Ok(None);
        }
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            full_name: user.full_name,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(Some(created))
    }

    async fn list(&self, role: Option<Role>) -> anyhow::Result<Vec<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect())
    }

    async fn count_by_role(&self, role: Role) -> anyhow::Result<i64> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().filter(|u| u.role == role).count() as i64)
    }

    async fn update_by_email(&self, email: &str, patch: UserPatch) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.email == email) else {
            return Ok(None);
        };
        if let Some(name) = patch.full_name {
            user.full_name = name;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn delete_by_email(&self, email: &str) -> anyhow::Result<bool> {
        let mut users = self.users.lock().unwrap();
        let Some(pos) = users.iter().position(|u| u.email == email) else {
            return Ok(false);
        };
        let removed = users.remove(pos);
        self.tasks.lock().unwrap().retain(|t| t.user_id != removed.id);
        Ok(true)
    }
}

fn compare_tasks(a: &Task, b: &Task, field: SortField) -> Ordering {
    match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::DueDate => a.due_date.cmp(&b.due_date),
        SortField::Title => a.title.cmp(&b.title),
        SortField::Status => a.status.cmp(&b.status),
        SortField::Priority => a.priority.cmp(&b.priority),
    }
}

#[async_trait]
impl TaskRepo for MemoryStore {
    async fn list(&self, owner: Uuid, filter: &TaskFilter) -> anyhow::Result<Vec<Task>> {
        let tasks = self.tasks.lock().unwrap();
        let mut out: Vec<Task> = tasks
            .iter()
            .filter(|t| t.user_id == owner)
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .filter(|t| filter.priority.map_or(true, |p| t.priority == p))
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            let ord = compare_tasks(a, b, filter.sort_by);
            let ord = match filter.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            ord.then_with(|| a.id.cmp(&b.id))
        });
        Ok(out)
    }

    async fn create(&self, owner: Uuid, task: NewTask) -> anyhow::Result<Task> {
        let now = OffsetDateTime::now_utc();
        let created = Task {
            id: Uuid::new_v4(),
            user_id: owner,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            created_at: now,
            updated_at: now,
        };
        self.tasks.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, owner: Uuid, id: Uuid, patch: TaskPatch) -> anyhow::Result<Option<Task>> {
        let mut tasks = self.tasks.lock().unwrap();
        let Some(task) = tasks.iter_mut().find(|t| t.id == id && t.user_id == owner) else {
            return Ok(None);
        };
        if let Some(v) = patch.title {
            task.title = v;
        }
        if let Some(v) = patch.description {
            task.description = v;
        }
        if let Some(v) = patch.status {
            task.status = v;
        }
        if let Some(v) = patch.priority {
            task.priority = v;
        }
        if let Some(v) = patch.due_date {
            task.due_date = v;
        }
        task.updated_at = OffsetDateTime::now_utc();
        Ok(Some(task.clone()))
    }

    async fn toggle_status(&self, owner: Uuid, id: Uuid) -> anyhow::Result<Option<Task>> {
        let mut tasks = self.tasks.lock().unwrap();
        let Some(task) = tasks.iter_mut().find(|t| t.id == id && t.user_id == owner) else {
            return Ok(None);
        };
        task.status = task.status.toggled();
        task.updated_at = OffsetDateTime::now_utc();
        Ok(Some(task.clone()))
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| !(t.id == id && t.user_id == owner));
        Ok(tasks.len() < before)
    }
}

#[async_trait]
impl LogRepo for MemoryStore {
    async fn insert(&self, log: NewUserLog) -> anyhow::Result<UserLog> {
        let row = UserLog {
            id: Uuid::new_v4(),
            user_id: log.user_id,
            user_name: log.user_name,
            user_email: log.user_email,
            role: log.role,
            action: log.action,
            login_time: log.login_time,
            logout_time: log.logout_time,
            token_id: log.token_id,
            ip_address: log.ip_address,
            user_agent: log.user_agent,
            session_duration: log.session_duration,
            created_at: OffsetDateTime::now_utc(),
        };
        self.logs.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn latest_login(&self, user_id: Uuid, token_id: &str) -> anyhow::Result<Option<UserLog>> {
        let logs = self.logs.lock().unwrap();
        // max_by_key keeps the last of equal keys: the newest insert
        Ok(logs
            .iter()
            .filter(|l| l.user_id == user_id && l.token_id == token_id)
            .filter(|l| l.action == LogAction::Login)
            .max_by_key(|l| l.created_at)
            .cloned())
    }

    async fn page(&self, offset: i64, limit: i64) -> anyhow::Result<Vec<UserLog>> {
        let logs = self.logs.lock().unwrap();
        let mut newest_first: Vec<UserLog> = logs.iter().cloned().collect();
        newest_first.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(newest_first
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.logs.lock().unwrap().len() as i64)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut logs = self.logs.lock().unwrap();
        let before = logs.len();
        logs.retain(|l| l.id != id);
        Ok(logs.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_row(user_id: Uuid) -> NewUserLog {
        NewUserLog {
            user_id,
            user_name: "Ann".into(),
            user_email: "ann@example.com".into(),
            role: Role::User,
            action: LogAction::Login,
            login_time: Some(OffsetDateTime::now_utc()),
            logout_time: None,
            token_id: "abcdefgh".into(),
            ip_address: "Unknown".into(),
            user_agent: "Unknown".into(),
            session_duration: None,
        }
    }

    #[tokio::test]
    async fn pages_with_equal_timestamps_never_overlap() {
        let store = MemoryStore::default();
        let user_id = Uuid::new_v4();
        for _ in 0..6 {
            store.insert(login_row(user_id)).await.unwrap();
        }
        let same = OffsetDateTime::now_utc();
        for row in store.logs.lock().unwrap().iter_mut() {
            row.created_at = same;
        }

        let mut seen = Vec::new();
        for offset in [0, 2, 4] {
            let page = store.page(offset, 2).await.unwrap();
            assert_eq!(page.len(), 2);
            seen.extend(page.into_iter().map(|l| l.id));
        }
        let mut sorted = seen.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(seen, sorted);
        sorted.dedup();
        assert_eq!(sorted.len(), 6);
    }
}
