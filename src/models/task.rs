use chrono::Local;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Placeholder shown until the user edits the task.
pub const DEFAULT_DESCRIPTION: &str = "(edit task for description)";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl Task {
    /// Builds a pending task from an already normalized request.
    pub fn create(id: i64, req: NewTask) -> Self {
        Self {
            id,
            title: req.title,
            description: req.description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            status: TaskStatus::Pending,
            created_at: now_timestamp(),
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Keeps `completed_at` in step with `status`.
    pub fn set_completed(&mut self, completed: bool) {
        if completed {
            self.status = TaskStatus::Completed;
            self.completed_at = Some(now_timestamp());
        } else {
            self.status = TaskStatus::Pending;
            self.completed_at = None;
        }
    }

    pub fn apply(&mut self, update: &TaskUpdate) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: title.into(),
            description,
        }
    }

    /// Trims the title and rejects it when blank. A blank description falls
    /// back to the placeholder.
    pub fn normalized(self) -> Result<Self, AppError> {
        let title = normalize_title(&self.title)?;
        let description = Some(normalize_description(self.description.as_deref()));
        Ok(Self { title, description })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl TaskUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: None,
        }
    }

    pub fn normalized(self) -> Result<Self, AppError> {
        let title = match self.title {
            Some(title) => Some(normalize_title(&title)?),
            None => None,
        };
        let description = self
            .description
            .map(|d| normalize_description(Some(&d)));
        Ok(Self { title, description })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

fn normalize_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("task title is required".to_string()));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<&str>) -> String {
    match description.map(str::trim) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => DEFAULT_DESCRIPTION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_rejects_blank_title() {
        let err = NewTask::new("   ", None).normalized().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_new_task_fills_placeholder_description() {
        let req = NewTask::new("  Buy milk ", Some(" ".to_string()))
            .normalized()
            .expect("valid title");
        assert_eq!(req.title, "Buy milk");
        assert_eq!(req.description.as_deref(), Some(DEFAULT_DESCRIPTION));
    }

    #[test]
    fn test_completion_toggles_completed_at() {
        let mut task = Task::create(1, NewTask::new("Buy milk", None));
        let created_at = task.created_at.clone();
        assert!(task.completed_at.is_none());

        task.set_completed(true);
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.completed_at.is_some());

        task.set_completed(false);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.completed_at.is_none());
        assert_eq!(task.created_at, created_at);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let task = Task::create(7, NewTask::new("Walk", None));
        let json = serde_json::to_value(&task).expect("serialize");
        assert_eq!(json["status"], "pending");
        assert!(json["completed_at"].is_null());
    }
}
