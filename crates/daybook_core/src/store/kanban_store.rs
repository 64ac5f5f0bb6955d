//! Kanban column labels.
//!
//! A column owns its tasks: [`KanbanStore::remove_column`] deletes the tasks
//! in the removed status along with the label.

use crate::repo::snapshot_repo::SnapshotStorage;
use crate::store::collection::{PersistentCollection, StoreResult, SubscriptionId};
use crate::store::task_store::{TaskStore, TaskStoreError};
use log::info;

/// Snapshot key of the kanban status list.
pub const STATUSES_KEY: &str = "kanban-statuses";

/// Columns shown before the user edits the board.
pub const DEFAULT_STATUSES: [&str; 4] = ["PLANNED", "ONGOING", "COMPLETED", "ABANDONED"];

/// Ordered, duplicate-free list of kanban status labels.
#[derive(Debug)]
pub struct KanbanStore<S: SnapshotStorage> {
    statuses: PersistentCollection<String, S>,
}

impl<S: SnapshotStorage> KanbanStore<S> {
    pub fn open(storage: S) -> StoreResult<Self> {
        let defaults = DEFAULT_STATUSES.iter().map(|s| s.to_string()).collect();
        Ok(Self {
            statuses: PersistentCollection::open_with_default(storage, STATUSES_KEY, defaults)?,
        })
    }

    pub fn statuses(&self) -> &[String] {
        self.statuses.get()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.statuses.get().iter().any(|status| status == label)
    }

    /// Appends a column. Returns `false` for blank or already known labels.
    pub fn add(&mut self, label: &str) -> StoreResult<bool> {
        let label = label.trim();
        if label.is_empty() || self.contains(label) {
            return Ok(false);
        }
        let mut next = self.statuses.get().to_vec();
        next.push(label.to_string());
        self.statuses.set(next)?;
        info!("event=kanban_status_add module=store status=ok label={label}");
        Ok(true)
    }

    /// Removes a column; returns whether it existed.
    pub fn remove(&mut self, label: &str) -> StoreResult<bool> {
        if !self.contains(label) {
            return Ok(false);
        }
        let next = self
            .statuses
            .get()
            .iter()
            .filter(|status| status.as_str() != label)
            .cloned()
            .collect();
        self.statuses.set(next)?;
        info!("event=kanban_status_remove module=store status=ok label={label}");
        Ok(true)
    }

    /// Deletes a column together with every task in that status.
    ///
    /// Returns the number of deleted tasks, or `None` when the column does
    /// not exist (nothing is changed then).
    pub fn remove_column<T: SnapshotStorage>(
        &mut self,
        tasks: &mut TaskStore<T>,
        label: &str,
    ) -> Result<Option<usize>, TaskStoreError> {
        if !self.contains(label) {
            return Ok(None);
        }
        self.remove(label)?;
        let removed = tasks.delete_by_status(label)?;
        info!("event=kanban_column_remove module=store status=ok label={label} tasks={removed}");
        Ok(Some(removed))
    }

    pub fn subscribe(&mut self, callback: impl Fn(&[String]) + 'static) -> SubscriptionId {
        self.statuses.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.statuses.unsubscribe(id)
    }
}
