//! Snapshot storage contract and its SQLite / in-memory implementations.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub type RepoResult<T> = Result<T, RepoError>;

/// Snapshot storage errors.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Reading or writing the snapshot stored under `key` failed.
    Snapshot {
        key: String,
        source: rusqlite::Error,
    },
    /// Storage key is blank.
    InvalidKey(String),
    /// Required table is missing; the connection was not migrated.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Snapshot { key, source } => {
                write!(f, "snapshot `{key}` storage failed: {source}")
            }
            Self::InvalidKey(key) => write!(f, "invalid snapshot key `{key}`"),
            Self::MissingRequiredTable(table) => {
                write!(f, "snapshot storage requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "snapshot storage requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Snapshot { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-value storage holding one JSON document per key.
pub trait SnapshotStorage {
    /// Loads the raw document stored under `key`.
    fn load(&self, key: &str) -> RepoResult<Option<String>>;
    /// Replaces the document stored under `key`.
    fn save(&self, key: &str, json: &str) -> RepoResult<()>;
}

impl<S: SnapshotStorage + ?Sized> SnapshotStorage for &S {
    fn load(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, json: &str) -> RepoResult<()> {
        (**self).save(key, json)
    }
}

/// SQLite-backed snapshot storage over the `snapshots` table.
#[derive(Debug, Clone, Copy)]
pub struct SqliteSnapshotStorage<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotStorage<'conn> {
    /// Wraps a migrated connection, verifying the snapshot schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_snapshot_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SnapshotStorage for SqliteSnapshotStorage<'_> {
    fn load(&self, key: &str) -> RepoResult<Option<String>> {
        ensure_key(key)?;
        let value = self
            .conn
            .query_row(
                "SELECT value FROM snapshots WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|source| snapshot_error(key, source))?;
        Ok(value)
    }

    fn save(&self, key: &str, json: &str) -> RepoResult<()> {
        ensure_key(key)?;
        self.conn.execute(
            "INSERT INTO snapshots (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, json],
        )
        .map_err(|source| snapshot_error(key, source))?;
        Ok(())
    }
}

/// In-memory snapshot storage; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStorage {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemorySnapshotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl SnapshotStorage for MemorySnapshotStorage {
    fn load(&self, key: &str) -> RepoResult<Option<String>> {
        ensure_key(key)?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn save(&self, key: &str, json: &str) -> RepoResult<()> {
        ensure_key(key)?;
        self.entries
            .borrow_mut()
            .insert(key.to_string(), json.to_string());
        Ok(())
    }
}

fn snapshot_error(key: &str, source: rusqlite::Error) -> RepoError {
    RepoError::Snapshot {
        key: key.to_string(),
        source,
    }
}

fn ensure_key(key: &str) -> RepoResult<()> {
    if key.trim().is_empty() {
        return Err(RepoError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn ensure_snapshot_connection_ready(conn: &Connection) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'snapshots'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::MissingRequiredTable("snapshots"));
    }

    let mut columns = Vec::new();
    let mut stmt = conn.prepare("PRAGMA table_info(snapshots);")?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    for column in ["key", "value", "updated_at"] {
        if !columns.iter().any(|current| current == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: "snapshots",
                column,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{MemorySnapshotStorage, RepoError, SnapshotStorage, SqliteSnapshotStorage};
    use crate::db::open_db_in_memory;
    use rusqlite::Connection;

    #[test]
    fn sqlite_storage_upserts_by_key() {
        let conn = open_db_in_memory().unwrap();
        let storage = SqliteSnapshotStorage::try_new(&conn).unwrap();

        assert_eq!(storage.load("tasks").unwrap(), None);
        storage.save("tasks", "[]").unwrap();
        storage.save("tasks", "[1]").unwrap();
        storage.save("journals", "[]").unwrap();

        assert_eq!(storage.load("tasks").unwrap().as_deref(), Some("[1]"));
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM snapshots;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 2);
    }

    #[test]
    fn sqlite_storage_errors_name_the_snapshot_key() {
        let conn = open_db_in_memory().unwrap();
        let storage = SqliteSnapshotStorage::try_new(&conn).unwrap();
        conn.execute_batch("DROP TABLE snapshots;").unwrap();

        let err = storage.load("tasks").unwrap_err();
        assert!(matches!(err, RepoError::Snapshot { ref key, .. } if key == "tasks"));
        assert!(err.to_string().contains("`tasks`"));
    }

    #[test]
    fn sqlite_storage_requires_migrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteSnapshotStorage::try_new(&conn).unwrap_err();
        assert!(matches!(err, RepoError::MissingRequiredTable("snapshots")));
    }

    #[test]
    fn memory_storage_clones_share_entries_and_reject_blank_keys() {
        let storage = MemorySnapshotStorage::new();
        let shared = storage.clone();
        storage.save("k", "{}").unwrap();
        assert_eq!(shared.load("k").unwrap().as_deref(), Some("{}"));
        assert_eq!(shared.len(), 1);
        assert!(matches!(
            storage.save("  ", "{}"),
            Err(RepoError::InvalidKey(_))
        ));
    }
}
