//! In-memory collection stores backed by snapshot storage.
//!
//! # Responsibility
//! - Hold each collection (journals, tasks, relations, kanban statuses) as a
//!   single in-memory value persisted wholesale on every write.
//! - Notify explicit subscribers synchronously after each write.
//!
//! # Invariants
//! - No module-level singletons: callers construct stores and pass them to
//!   the consumers that need them.
//! - Cross-store reads go through [`TaskLookup`] / [`JournalLookup`].

pub mod collection;
pub mod journal_edit;
pub mod journal_store;
pub mod kanban_store;
pub mod relation_store;
pub mod task_store;

use crate::model::journal::Journal;
use crate::model::task::Task;

/// Read access to live tasks by id.
pub trait TaskLookup {
    fn task_by_id(&self, id: &str) -> Option<&Task>;
}

/// Read access to live journals by path.
pub trait JournalLookup {
    fn journal_by_path(&self, path: &str) -> Option<&Journal>;
}

impl TaskLookup for [Task] {
    fn task_by_id(&self, id: &str) -> Option<&Task> {
        self.iter().find(|task| task.id == id)
    }
}

impl JournalLookup for [Journal] {
    fn journal_by_path(&self, path: &str) -> Option<&Journal> {
        self.iter().find(|journal| journal.path == path)
    }
}
