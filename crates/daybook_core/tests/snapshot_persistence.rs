use daybook_core::db::open_db;
use daybook_core::{
    JournalStore, KanbanStore, NewTask, RelationStore, SqliteSnapshotStorage, TaskStore,
    TaskUpdate,
};
use std::cell::Cell;
use std::rc::Rc;

const DUE: i64 = 1_717_900_000_000;

#[test]
fn collections_survive_reopening_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("daybook.db");

    {
        let conn = open_db(&path).unwrap();
        let storage = SqliteSnapshotStorage::try_new(&conn).unwrap();
        let mut tasks = TaskStore::open(storage).unwrap();
        let mut journals = JournalStore::open(storage).unwrap();
        let mut kanban = KanbanStore::open(storage).unwrap();
        let mut relations = RelationStore::open(storage).unwrap();

        tasks
            .create(NewTask::new("Write report", "PLANNED", DUE).with_id("1"))
            .unwrap();
        tasks
            .update(
                "1",
                TaskUpdate {
                    status: Some("ONGOING".to_string()),
                    ..TaskUpdate::default()
                },
            )
            .unwrap();
        journals
            .create("Notes", "work/report", "draft", &["work".to_string()])
            .unwrap();
        kanban.add("REVIEW").unwrap();
        relations
            .link(&tasks, &journals, "1", "work/report")
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let storage = SqliteSnapshotStorage::try_new(&conn).unwrap();
    let tasks = TaskStore::open(storage).unwrap();
    let journals = JournalStore::open(storage).unwrap();
    let kanban = KanbanStore::open(storage).unwrap();
    let relations = RelationStore::open(storage).unwrap();

    assert_eq!(tasks.get_by_id("1").unwrap().status, "ONGOING");
    assert_eq!(journals.get_by_path("work/report").unwrap().content, "draft");
    assert!(kanban.contains("REVIEW"));
    let linked = relations.journals_for_task(&journals, "1");
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].title, "Notes");

    let mut stmt = conn
        .prepare("SELECT key FROM snapshots ORDER BY key ASC;")
        .unwrap();
    let keys: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        keys,
        vec!["journals", "kanban-statuses", "taskJournalMappings", "tasks"]
    );
}

#[test]
fn subscribers_see_every_successful_write() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("daybook.db")).unwrap();
    let storage = SqliteSnapshotStorage::try_new(&conn).unwrap();
    let mut tasks = TaskStore::open(storage).unwrap();

    let seen = Rc::new(Cell::new(0usize));
    let observer = Rc::clone(&seen);
    let id = tasks.subscribe(move |items| observer.set(items.len()));

    tasks
        .create(NewTask::new("One", "PLANNED", DUE).with_id("1"))
        .unwrap();
    tasks
        .create(NewTask::new("Two", "PLANNED", DUE).with_id("2"))
        .unwrap();
    assert_eq!(seen.get(), 2);

    assert!(tasks.create(NewTask::new("Dup", "PLANNED", DUE).with_id("2")).is_err());
    assert_eq!(seen.get(), 2);

    assert!(tasks.unsubscribe(id));
    tasks.delete("1").unwrap();
    assert_eq!(seen.get(), 2);
}

#[test]
fn storage_rejects_connection_without_snapshot_table() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    assert!(SqliteSnapshotStorage::try_new(&conn).is_err());
}
