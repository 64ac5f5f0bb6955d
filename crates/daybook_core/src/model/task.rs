//! Task domain model.
//!
//! # Invariants
//! - `id` is unique within the task store and never reassigned.
//! - `status` is a free label; the kanban store owns the known set.
//! - `due_at` is stored truncated to the start of its UTC day.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix for generated task ids.
const GENERATED_ID_PREFIX: &str = "task-";

/// To-do item shown on the calendar and kanban board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: String,
    pub status: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds, start of the UTC due day.
    pub due_at: i64,
}

/// Creation request for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Caller-provided id; generated when `None`.
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    /// Any instant on the due day, epoch milliseconds.
    pub due_at: i64,
}

impl NewTask {
    /// Creates a request with empty description/priority and generated id.
    pub fn new(title: impl Into<String>, status: impl Into<String>, due_at: i64) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: String::new(),
            priority: String::new(),
            status: status.into(),
            due_at,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due_at: Option<i64>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.due_at.is_none()
    }
}

/// Generates a fresh task id.
pub fn generate_task_id() -> String {
    format!("{GENERATED_ID_PREFIX}{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::{generate_task_id, Task, TaskUpdate};

    #[test]
    fn generated_ids_are_prefixed_and_unique() {
        let first = generate_task_id();
        let second = generate_task_id();
        assert!(first.starts_with("task-"));
        assert_ne!(first, second);
    }

    #[test]
    fn task_decodes_snapshot_without_optional_text_fields() {
        let task: Task = serde_json::from_str(
            r#"{"id":"1","title":"T","status":"PLANNED","createdAt":1,"dueAt":2}"#,
        )
        .unwrap();
        assert_eq!(task.description, "");
        assert_eq!(task.due_at, 2);
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(TaskUpdate::default().is_empty());
        let update = TaskUpdate {
            status: Some("DONE".to_string()),
            ..TaskUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
