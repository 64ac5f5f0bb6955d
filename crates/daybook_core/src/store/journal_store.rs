//! Journal collection store.
//!
//! # Responsibility
//! - Own the `journals` snapshot and its change notifications.
//! - Enforce path uniqueness and normalization on every write.
//!
//! # Invariants
//! - At most one journal per normalized path.
//! - Store order is creation order; the tree builder relies on it.

use crate::model::journal::{
    normalize_journal_path, normalize_tags, Journal, JournalValidationError,
};
use crate::model::now_epoch_ms;
use crate::repo::snapshot_repo::SnapshotStorage;
use crate::store::collection::{PersistentCollection, StoreError, StoreResult, SubscriptionId};
use crate::store::JournalLookup;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Snapshot key of the journal collection.
pub const JOURNALS_KEY: &str = "journals";

/// Errors from journal store writes.
#[derive(Debug)]
pub enum JournalStoreError {
    Validation(JournalValidationError),
    /// Another journal already uses this normalized path.
    DuplicatePath(String),
    Store(StoreError),
}

impl Display for JournalStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicatePath(path) => write!(f, "Journal with path {path} already exists!"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for JournalStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::DuplicatePath(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<JournalValidationError> for JournalStoreError {
    fn from(value: JournalValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for JournalStoreError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Partial journal edit; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Persisted journal collection.
#[derive(Debug)]
pub struct JournalStore<S: SnapshotStorage> {
    journals: PersistentCollection<Journal, S>,
}

impl<S: SnapshotStorage> JournalStore<S> {
    /// Loads the journal snapshot from `storage`.
    pub fn open(storage: S) -> StoreResult<Self> {
        Ok(Self {
            journals: PersistentCollection::open(storage, JOURNALS_KEY)?,
        })
    }

    /// All journals in store order.
    pub fn get_all(&self) -> &[Journal] {
        self.journals.get()
    }

    /// Journal stored at exactly `path`, if any.
    pub fn get_by_path(&self, path: &str) -> Option<&Journal> {
        self.journals.get().iter().find(|journal| journal.path == path)
    }

    /// Paths of all journals in store order.
    pub fn paths(&self) -> Vec<String> {
        self.journals
            .get()
            .iter()
            .map(|journal| journal.path.clone())
            .collect()
    }

    /// Creates a journal at a normalized `path`.
    ///
    /// # Errors
    /// - `Validation` when the path or a tag is invalid.
    /// - `DuplicatePath` when a journal already exists at the path.
    pub fn create(
        &mut self,
        title: impl Into<String>,
        path: &str,
        content: impl Into<String>,
        tags: &[String],
    ) -> Result<Journal, JournalStoreError> {
        let path = normalize_journal_path(path)?;
        if self.get_by_path(&path).is_some() {
            return Err(JournalStoreError::DuplicatePath(path));
        }
        let tags = normalize_tags(tags)?;

        let journal = Journal {
            path,
            title: title.into(),
            content: content.into(),
            tags,
            created_at: now_epoch_ms(),
            modified_at: None,
        };

        let mut next = self.journals.get().to_vec();
        next.push(journal.clone());
        self.journals.set(next)?;

        info!(
            "event=journal_create module=store status=ok path={} total={}",
            journal.path,
            self.journals.get().len()
        );
        Ok(journal)
    }

    /// Applies a partial edit and stamps `modified_at`.
    ///
    /// Returns `false` when no journal exists at `path`.
    pub fn update(&mut self, path: &str, update: JournalUpdate) -> Result<bool, JournalStoreError> {
        let tags = update.tags.as_deref().map(normalize_tags).transpose()?;
        let mut next = self.journals.get().to_vec();
        let Some(entry) = next.iter_mut().find(|journal| journal.path == path) else {
            return Ok(false);
        };

        if let Some(title) = update.title {
            entry.title = title;
        }
        if let Some(content) = update.content {
            entry.content = content;
        }
        if let Some(tags) = tags {
            entry.tags = tags;
        }
        entry.modified_at = Some(now_epoch_ms());

        self.journals.set(next)?;
        info!("event=journal_update module=store status=ok path={path}");
        Ok(true)
    }

    /// Removes the journal at `path`; returns whether one was removed.
    ///
    /// Relation pairs pointing at the journal are left in place.
    pub fn delete(&mut self, path: &str) -> Result<bool, JournalStoreError> {
        let before = self.journals.get().len();
        let next: Vec<Journal> = self
            .journals
            .get()
            .iter()
            .filter(|journal| journal.path != path)
            .cloned()
            .collect();
        if next.len() == before {
            return Ok(false);
        }

        self.journals.set(next)?;
        info!("event=journal_delete module=store status=ok path={path}");
        Ok(true)
    }

    /// Registers a change listener receiving the full journal list.
    pub fn subscribe(&mut self, callback: impl Fn(&[Journal]) + 'static) -> SubscriptionId {
        self.journals.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.journals.unsubscribe(id)
    }
}

impl<S: SnapshotStorage> JournalLookup for JournalStore<S> {
    fn journal_by_path(&self, path: &str) -> Option<&Journal> {
        self.get_by_path(path)
    }
}
