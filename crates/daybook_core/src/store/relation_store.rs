//! Task <-> journal relation store.
//!
//! # Responsibility
//! - Own the `taskJournalMappings` snapshot of link pairs.
//! - Validate both endpoints at link time and serve lookups from either side.
//!
//! # Invariants
//! - A pair is stored at most once; linking an existing pair is a no-op.
//! - `link` checks the task before the journal and writes nothing on error.
//! - Deleting a task or journal does not touch stored pairs; lookups join
//!   against the live stores and skip dangling pairs instead.
//! - Only `ReferenceIntegrity` is a domain error; every other read is total.

use crate::model::journal::Journal;
use crate::model::relation::TaskJournalLink;
use crate::model::task::Task;
use crate::repo::snapshot_repo::SnapshotStorage;
use crate::store::collection::{PersistentCollection, StoreError, StoreResult, SubscriptionId};
use crate::store::{JournalLookup, TaskLookup};
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Snapshot key of the relation collection.
pub const RELATIONS_KEY: &str = "taskJournalMappings";

/// Side of a relation pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Task,
    Journal,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Task => write!(f, "Task"),
            Self::Journal => write!(f, "Journal"),
        }
    }
}

/// Errors from relation writes.
#[derive(Debug)]
pub enum RelationError {
    /// Link endpoint does not resolve to a live entity.
    ReferenceIntegrity { kind: EntityKind, id: String },
    Store(StoreError),
}

impl Display for RelationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReferenceIntegrity { kind, id } => {
                write!(f, "{kind} with ID {id} does not exist!")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RelationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReferenceIntegrity { .. } => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for RelationError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Persisted set of task <-> journal pairs.
#[derive(Debug)]
pub struct RelationStore<S: SnapshotStorage> {
    links: PersistentCollection<TaskJournalLink, S>,
}

impl<S: SnapshotStorage> RelationStore<S> {
    pub fn open(storage: S) -> StoreResult<Self> {
        Ok(Self {
            links: PersistentCollection::open(storage, RELATIONS_KEY)?,
        })
    }

    /// Stored pairs, dangling ones included.
    pub fn links(&self) -> &[TaskJournalLink] {
        self.links.get()
    }

    /// Links `task_id` to `journal_id`.
    ///
    /// Returns `Ok(true)` when a new pair was stored and `Ok(false)` when the
    /// pair already existed.
    ///
    /// # Errors
    /// - `ReferenceIntegrity { kind: Task }` when the task does not exist,
    ///   regardless of the journal.
    /// - `ReferenceIntegrity { kind: Journal }` when the task exists but the
    ///   journal does not.
    pub fn link<T, J>(
        &mut self,
        tasks: &T,
        journals: &J,
        task_id: &str,
        journal_id: &str,
    ) -> Result<bool, RelationError>
    where
        T: TaskLookup + ?Sized,
        J: JournalLookup + ?Sized,
    {
        ensure_task(tasks, task_id)?;
        ensure_journal(journals, journal_id)?;

        if self.contains(task_id, journal_id) {
            return Ok(false);
        }

        let mut next = self.links.get().to_vec();
        next.push(TaskJournalLink::new(task_id, journal_id));
        self.links.set(next)?;
        info!("event=relation_link module=store status=ok task_id={task_id} journal_id={journal_id}");
        Ok(true)
    }

    /// Removes every pair matching both ids; returns whether any was removed.
    pub fn unlink(&mut self, task_id: &str, journal_id: &str) -> Result<bool, RelationError> {
        let before = self.links.get().len();
        let next: Vec<TaskJournalLink> = self
            .links
            .get()
            .iter()
            .filter(|link| !link.matches(task_id, journal_id))
            .cloned()
            .collect();
        if next.len() == before {
            return Ok(false);
        }

        self.links.set(next)?;
        info!(
            "event=relation_unlink module=store status=ok task_id={task_id} journal_id={journal_id}"
        );
        Ok(true)
    }

    /// Returns whether the exact pair is stored.
    pub fn contains(&self, task_id: &str, journal_id: &str) -> bool {
        self.links
            .get()
            .iter()
            .any(|link| link.matches(task_id, journal_id))
    }

    /// Live journals linked to `task_id`, in link order.
    pub fn journals_for_task<'j, J>(&self, journals: &'j J, task_id: &str) -> Vec<&'j Journal>
    where
        J: JournalLookup + ?Sized,
    {
        let mut seen = HashSet::new();
        self.links
            .get()
            .iter()
            .filter(|link| link.task_id == task_id)
            .filter(|link| seen.insert(link.journal_id.as_str()))
            .filter_map(|link| journals.journal_by_path(&link.journal_id))
            .collect()
    }

    /// Live tasks linked to `journal_id`, in link order.
    pub fn tasks_for_journal<'t, T>(&self, tasks: &'t T, journal_id: &str) -> Vec<&'t Task>
    where
        T: TaskLookup + ?Sized,
    {
        let mut seen = HashSet::new();
        self.links
            .get()
            .iter()
            .filter(|link| link.journal_id == journal_id)
            .filter(|link| seen.insert(link.task_id.as_str()))
            .filter_map(|link| tasks.task_by_id(&link.task_id))
            .collect()
    }

    /// Replaces the set of tasks linked to one journal.
    ///
    /// Every id is validated before anything is written, so a failure leaves
    /// the stored pairs untouched. Pairs of other journals are preserved.
    pub fn replace_tasks_for_journal<T, J>(
        &mut self,
        tasks: &T,
        journals: &J,
        journal_id: &str,
        task_ids: &[String],
    ) -> Result<(), RelationError>
    where
        T: TaskLookup + ?Sized,
        J: JournalLookup + ?Sized,
    {
        for task_id in task_ids {
            ensure_task(tasks, task_id)?;
        }
        if !task_ids.is_empty() {
            ensure_journal(journals, journal_id)?;
        }

        let mut next: Vec<TaskJournalLink> = self
            .links
            .get()
            .iter()
            .filter(|link| link.journal_id != journal_id)
            .cloned()
            .collect();
        for task_id in task_ids {
            if !next.iter().any(|link| link.matches(task_id, journal_id)) {
                next.push(TaskJournalLink::new(task_id.as_str(), journal_id));
            }
        }

        if next.as_slice() == self.links.get() {
            return Ok(());
        }
        self.links.set(next)?;
        info!(
            "event=relation_replace module=store status=ok journal_id={journal_id} tasks={}",
            task_ids.len()
        );
        Ok(())
    }

    /// Drops pairs whose task or journal no longer exists.
    ///
    /// Returns the number of removed pairs.
    pub fn prune_dangling<T, J>(&mut self, tasks: &T, journals: &J) -> Result<usize, RelationError>
    where
        T: TaskLookup + ?Sized,
        J: JournalLookup + ?Sized,
    {
        let before = self.links.get().len();
        let next: Vec<TaskJournalLink> = self
            .links
            .get()
            .iter()
            .filter(|link| {
                tasks.task_by_id(&link.task_id).is_some()
                    && journals.journal_by_path(&link.journal_id).is_some()
            })
            .cloned()
            .collect();
        let removed = before - next.len();
        if removed == 0 {
            return Ok(0);
        }

        self.links.set(next)?;
        warn!("event=relation_prune module=store status=ok removed={removed}");
        Ok(removed)
    }

    pub fn subscribe(
        &mut self,
        callback: impl Fn(&[TaskJournalLink]) + 'static,
    ) -> SubscriptionId {
        self.links.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.links.unsubscribe(id)
    }
}

fn ensure_task<T: TaskLookup + ?Sized>(tasks: &T, task_id: &str) -> Result<(), RelationError> {
    if tasks.task_by_id(task_id).is_none() {
        return Err(RelationError::ReferenceIntegrity {
            kind: EntityKind::Task,
            id: task_id.to_string(),
        });
    }
    Ok(())
}

fn ensure_journal<J: JournalLookup + ?Sized>(
    journals: &J,
    journal_id: &str,
) -> Result<(), RelationError> {
    if journals.journal_by_path(journal_id).is_none() {
        return Err(RelationError::ReferenceIntegrity {
            kind: EntityKind::Journal,
            id: journal_id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{EntityKind, RelationError, RelationStore};
    use crate::model::journal::Journal;
    use crate::model::task::Task;
    use crate::repo::snapshot_repo::MemorySnapshotStorage;

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: String::new(),
            priority: "High".to_string(),
            status: "PLANNED".to_string(),
            created_at: 0,
            due_at: 0,
        }
    }

    fn journal(path: &str) -> Journal {
        Journal {
            path: path.to_string(),
            title: format!("Journal {path}"),
            content: String::new(),
            tags: Vec::new(),
            created_at: 0,
            modified_at: None,
        }
    }

    #[test]
    fn missing_task_is_reported_before_missing_journal() {
        let mut relations = RelationStore::open(MemorySnapshotStorage::new()).unwrap();
        let tasks: Vec<Task> = Vec::new();
        let journals: Vec<Journal> = Vec::new();

        let err = relations
            .link(tasks.as_slice(), journals.as_slice(), "999", "nowhere")
            .unwrap_err();
        assert!(matches!(
            err,
            RelationError::ReferenceIntegrity { kind: EntityKind::Task, ref id } if id == "999"
        ));
        assert_eq!(err.to_string(), "Task with ID 999 does not exist!");
        assert!(relations.links().is_empty());
    }

    #[test]
    fn duplicate_link_is_a_no_op() {
        let mut relations = RelationStore::open(MemorySnapshotStorage::new()).unwrap();
        let tasks = vec![task("1")];
        let journals = vec![journal("j")];

        assert!(relations
            .link(tasks.as_slice(), journals.as_slice(), "1", "j")
            .unwrap());
        assert!(!relations
            .link(tasks.as_slice(), journals.as_slice(), "1", "j")
            .unwrap());
        assert_eq!(relations.links().len(), 1);
    }

    #[test]
    fn replace_validates_everything_before_writing() {
        let mut relations = RelationStore::open(MemorySnapshotStorage::new()).unwrap();
        let tasks = vec![task("1"), task("2"), task("3")];
        let journals = vec![journal("j"), journal("k")];
        relations
            .link(tasks.as_slice(), journals.as_slice(), "1", "j")
            .unwrap();
        relations
            .link(tasks.as_slice(), journals.as_slice(), "1", "k")
            .unwrap();

        let err = relations
            .replace_tasks_for_journal(
                tasks.as_slice(),
                journals.as_slice(),
                "j",
                &["2".to_string(), "404".to_string()],
            )
            .unwrap_err();
        assert!(matches!(err, RelationError::ReferenceIntegrity { kind: EntityKind::Task, .. }));
        assert!(relations.contains("1", "j"));

        relations
            .replace_tasks_for_journal(
                tasks.as_slice(),
                journals.as_slice(),
                "j",
                &["2".to_string(), "3".to_string(), "2".to_string()],
            )
            .unwrap();
        let linked: Vec<&str> = relations
            .tasks_for_journal(tasks.as_slice(), "j")
            .iter()
            .map(|task| task.id.as_str())
            .collect();
        assert_eq!(linked, vec!["2", "3"]);
        assert!(relations.contains("1", "k"));
    }

    #[test]
    fn prune_removes_only_dangling_pairs() {
        let mut relations = RelationStore::open(MemorySnapshotStorage::new()).unwrap();
        let mut tasks = vec![task("1"), task("2")];
        let journals = vec![journal("j")];
        relations
            .link(tasks.as_slice(), journals.as_slice(), "1", "j")
            .unwrap();
        relations
            .link(tasks.as_slice(), journals.as_slice(), "2", "j")
            .unwrap();

        tasks.retain(|task| task.id != "2");
        assert_eq!(
            relations
                .prune_dangling(tasks.as_slice(), journals.as_slice())
                .unwrap(),
            1
        );
        assert_eq!(
            relations
                .prune_dangling(tasks.as_slice(), journals.as_slice())
                .unwrap(),
            0
        );
        assert!(relations.contains("1", "j"));
        assert!(!relations.contains("2", "j"));
    }
}
