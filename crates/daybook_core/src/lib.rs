//! Core domain logic for daybook.
//! This crate is the single source of truth for journal, task and relation
//! invariants; UI layers only render what it returns.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;
pub mod tree;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::journal::{Journal, JournalValidationError};
pub use model::relation::TaskJournalLink;
pub use model::task::{NewTask, Task, TaskUpdate};
pub use repo::snapshot_repo::{
    MemorySnapshotStorage, RepoError, RepoResult, SnapshotStorage, SqliteSnapshotStorage,
};
pub use store::collection::{PersistentCollection, StoreError, StoreResult, SubscriptionId};
pub use store::journal_edit::{save_journal_edit, JournalEdit, JournalEditError};
pub use store::journal_store::{JournalStore, JournalStoreError, JournalUpdate};
pub use store::kanban_store::KanbanStore;
pub use store::relation_store::{EntityKind, RelationError, RelationStore};
pub use store::task_store::{TaskStore, TaskStoreError, UpcomingDay};
pub use store::{JournalLookup, TaskLookup};
pub use tree::builder::{build_tree, split_path, PathNode, PathTree, TreeEntry};
pub use tree::view::{
    attach_tree_view, delete_selected_journal, render_entries, FolderState, JournalViewer,
    RecordingViewer, TreeActivation, TreeElement, TreeElementKind, TreeMount, TreeView,
    TreeViewError, TreeViewState,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
