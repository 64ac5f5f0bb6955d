//! Journal editor save.
//!
//! # Responsibility
//! - Turn the editor's raw fields (comma separated tags, selected task ids)
//!   into one journal update plus the journal's task links.
//!
//! # Invariants
//! - Task ids are validated before anything is written; an unknown id leaves
//!   both the journal and its links untouched.
//! - Links of other journals are never changed.

use crate::model::journal::parse_tag_list;
use crate::repo::snapshot_repo::SnapshotStorage;
use crate::store::journal_store::{JournalStore, JournalStoreError, JournalUpdate};
use crate::store::relation_store::{RelationError, RelationStore};
use crate::store::task_store::TaskStore;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from saving an editor session.
#[derive(Debug)]
pub enum JournalEditError {
    Journal(JournalStoreError),
    Relation(RelationError),
}

impl Display for JournalEditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Journal(err) => write!(f, "{err}"),
            Self::Relation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for JournalEditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Journal(err) => Some(err),
            Self::Relation(err) => Some(err),
        }
    }
}

impl From<JournalStoreError> for JournalEditError {
    fn from(value: JournalStoreError) -> Self {
        Self::Journal(value)
    }
}

impl From<RelationError> for JournalEditError {
    fn from(value: RelationError) -> Self {
        Self::Relation(value)
    }
}

/// Field values of the journal editor at save time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalEdit {
    pub title: String,
    pub content: String,
    /// Raw tag field, e.g. `"work, ideas"`.
    pub tags: String,
    /// Tasks selected in the editor's task picker.
    pub task_ids: Vec<String>,
}

/// Saves an editor session for the journal at `path`.
///
/// The journal's task links become exactly `edit.task_ids`. Returns
/// `Ok(false)` when no journal exists at `path`.
pub fn save_journal_edit<J, T, R>(
    journals: &mut JournalStore<J>,
    tasks: &TaskStore<T>,
    relations: &mut RelationStore<R>,
    path: &str,
    edit: JournalEdit,
) -> Result<bool, JournalEditError>
where
    J: SnapshotStorage,
    T: SnapshotStorage,
    R: SnapshotStorage,
{
    if journals.get_by_path(path).is_none() {
        return Ok(false);
    }

    relations.replace_tasks_for_journal(tasks, &*journals, path, &edit.task_ids)?;
    journals.update(
        path,
        JournalUpdate {
            title: Some(edit.title),
            content: Some(edit.content),
            tags: Some(parse_tag_list(&edit.tags)),
        },
    )?;

    info!(
        "event=journal_save module=store status=ok path={path} tasks={}",
        edit.task_ids.len()
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::{save_journal_edit, JournalEdit, JournalEditError};
    use crate::model::task::NewTask;
    use crate::repo::snapshot_repo::MemorySnapshotStorage;
    use crate::store::journal_store::JournalStore;
    use crate::store::relation_store::RelationStore;
    use crate::store::task_store::TaskStore;

    const DUE: i64 = 1_717_900_000_000;

    #[test]
    fn save_updates_fields_tags_and_links() {
        let storage = MemorySnapshotStorage::new();
        let mut journals = JournalStore::open(storage.clone()).unwrap();
        let mut tasks = TaskStore::open(storage.clone()).unwrap();
        let mut relations = RelationStore::open(storage).unwrap();
        journals.create("Old", "a", "", &[]).unwrap();
        for id in ["1", "2"] {
            tasks
                .create(NewTask::new(id, "PLANNED", DUE).with_id(id))
                .unwrap();
        }
        relations.link(&tasks, &journals, "1", "a").unwrap();

        let saved = save_journal_edit(
            &mut journals,
            &tasks,
            &mut relations,
            "a",
            JournalEdit {
                title: "New".to_string(),
                content: "body".to_string(),
                tags: " work , ideas,,work".to_string(),
                task_ids: vec!["2".to_string()],
            },
        )
        .unwrap();
        assert!(saved);

        let journal = journals.get_by_path("a").unwrap();
        assert_eq!(journal.title, "New");
        assert_eq!(journal.tags, vec!["work", "ideas", "work"]);
        assert!(journal.modified_at.is_some());
        let linked: Vec<&str> = relations
            .tasks_for_journal(&tasks, "a")
            .iter()
            .map(|task| task.id.as_str())
            .collect();
        assert_eq!(linked, vec!["2"]);
    }

    #[test]
    fn unknown_task_leaves_journal_and_links_untouched() {
        let storage = MemorySnapshotStorage::new();
        let mut journals = JournalStore::open(storage.clone()).unwrap();
        let mut tasks = TaskStore::open(storage.clone()).unwrap();
        let mut relations = RelationStore::open(storage).unwrap();
        journals.create("Old", "a", "", &[]).unwrap();
        tasks
            .create(NewTask::new("1", "PLANNED", DUE).with_id("1"))
            .unwrap();
        relations.link(&tasks, &journals, "1", "a").unwrap();

        let err = save_journal_edit(
            &mut journals,
            &tasks,
            &mut relations,
            "a",
            JournalEdit {
                title: "New".to_string(),
                task_ids: vec!["999".to_string()],
                ..JournalEdit::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, JournalEditError::Relation(_)));
        assert_eq!(journals.get_by_path("a").unwrap().title, "Old");
        assert!(relations.contains("1", "a"));
    }

    #[test]
    fn missing_journal_is_reported_as_not_saved() {
        let storage = MemorySnapshotStorage::new();
        let mut journals = JournalStore::open(storage.clone()).unwrap();
        let tasks = TaskStore::open(storage.clone()).unwrap();
        let mut relations = RelationStore::open(storage).unwrap();

        let saved = save_journal_edit(
            &mut journals,
            &tasks,
            &mut relations,
            "missing",
            JournalEdit::default(),
        )
        .unwrap();
        assert!(!saved);
        assert!(relations.links().is_empty());
    }
}
