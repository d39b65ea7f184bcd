use serde::Deserialize;
use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};

use super::repo_types::{
    NewTask, SortField, SortOrder, TaskFilter, TaskPatch, TaskPriority, TaskStatus,
};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

/// Accepts RFC 3339 timestamps or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_due_date(raw: &str) -> Result<OffsetDateTime, String> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(ts);
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map(|d| d.midnight().assume_utc())
        .map_err(|_| format!("`{}` is not a valid due date", raw))
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parses an optional enum field, collecting the message on failure.
fn parse_field<T: std::str::FromStr<Err = String>>(
    raw: Option<&str>,
    errors: &mut Vec<String>,
) -> Option<T> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(v) => match v.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                errors.push(e);
                None
            }
        },
        None => None,
    }
}

impl CreateTaskRequest {
    pub fn into_new_task(self) -> Result<NewTask, ApiError> {
        let (Some(title), Some(description), Some(due_raw)) = (
            non_blank(self.title),
            non_blank(self.description),
            non_blank(self.due_date),
        ) else {
            return Err(ApiError::BadRequest(
                "Title, description, and due date are required".into(),
            ));
        };

        let mut errors = Vec::new();
        let status = parse_field::<TaskStatus>(self.status.as_deref(), &mut errors);
        let priority = parse_field::<TaskPriority>(self.priority.as_deref(), &mut errors);
        let due_date = parse_due_date(&due_raw).map_err(|e| errors.push(e)).ok();

        match due_date {
            Some(due_date) if errors.is_empty() => Ok(NewTask {
                title,
                description,
                status: status.unwrap_or(TaskStatus::Incomplete),
                priority: priority.unwrap_or(TaskPriority::Medium),
                due_date,
            }),
            _ => Err(ApiError::validation(errors)),
        }
    }
}

impl UpdateTaskRequest {
    pub fn into_patch(self) -> Result<TaskPatch, ApiError> {
        let mut errors = Vec::new();

        let title = self.title.map(|t| t.trim().to_string());
        if title.as_deref() == Some("") {
            errors.push("Title cannot be empty".to_string());
        }
        let description = self.description.map(|d| d.trim().to_string());
        if description.as_deref() == Some("") {
            errors.push("Description cannot be empty".to_string());
        }
        let status = parse_field::<TaskStatus>(self.status.as_deref(), &mut errors);
        let priority = parse_field::<TaskPriority>(self.priority.as_deref(), &mut errors);
        let due_date = match self.due_date.as_deref().map(str::trim) {
            None => None,
            Some("") => {
                errors.push("Due date cannot be empty".to_string());
                None
            }
            Some(raw) => parse_due_date(raw).map_err(|e| errors.push(e)).ok(),
        };

        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }
        Ok(TaskPatch {
            title,
            description,
            status,
            priority,
            due_date,
        })
    }
}

impl TaskQuery {
    pub fn into_filter(self) -> Result<TaskFilter, ApiError> {
        let mut errors = Vec::new();
        let status = parse_field::<TaskStatus>(self.status.as_deref(), &mut errors);
        let priority = parse_field::<TaskPriority>(self.priority.as_deref(), &mut errors);
        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }
        Ok(TaskFilter {
            status,
            priority,
            sort_by: self
                .sort_by
                .as_deref()
                .map(SortField::from_query)
                .unwrap_or_default(),
            order: self
                .order
                .as_deref()
                .map(SortOrder::from_query)
                .unwrap_or_default(),
        })
    }
}
