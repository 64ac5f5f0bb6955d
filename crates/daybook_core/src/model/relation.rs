//! Task <-> journal relation pair.

use serde::{Deserialize, Serialize};

/// One link between a task id and a journal path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskJournalLink {
    pub task_id: String,
    /// Journals are keyed by path, so this is the journal path.
    pub journal_id: String,
}

impl TaskJournalLink {
    pub fn new(task_id: impl Into<String>, journal_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            journal_id: journal_id.into(),
        }
    }

    /// Returns whether this pair links exactly `task_id` and `journal_id`.
    pub fn matches(&self, task_id: &str, journal_id: &str) -> bool {
        self.task_id == task_id && self.journal_id == journal_id
    }
}
