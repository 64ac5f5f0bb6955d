//! CLI inspector for a daybook snapshot database.
//!
//! # Responsibility
//! - Open the store described by an optional JSON config path.
//! - Print the journal tree, the upcoming agenda and task/journal links.
//!
//! Usage: `daybook_cli [config.json]`

use daybook_core::db::{open_db, open_db_in_memory};
use daybook_core::model::now_epoch_ms;
use daybook_core::{
    init_logging, CoreConfig, JournalStore, KanbanStore, RecordingViewer, RelationStore,
    SqliteSnapshotStorage, TaskStore, TreeElement, TreeView,
};
use log::info;
use std::error::Error;

fn main() {
    if let Err(err) = run() {
        eprintln!("daybook_cli: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    if let Some(dir) = &config.log_dir {
        init_logging(&config.log_level, &dir.to_string_lossy())?;
    }

    let conn = match &config.database_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let storage = SqliteSnapshotStorage::try_new(&conn)?;
    let journals = JournalStore::open(storage)?;
    let tasks = TaskStore::open(storage)?;
    let kanban = KanbanStore::open(storage)?;
    let relations = RelationStore::open(storage)?;
    info!(
        "event=cli_open module=cli status=ok journals={} tasks={} links={}",
        journals.get_all().len(),
        tasks.get_all().len(),
        relations.links().len()
    );

    println!("daybook_core version={}", daybook_core::core_version());

    let mut view = TreeView::new(config.tree_root.as_str(), RecordingViewer::default())?;
    view.rebuild(journals.paths());
    println!("journals:");
    print_elements(view.elements(), 1);

    println!("statuses: {}", kanban.statuses().join(", "));

    println!("upcoming:");
    for day in tasks.upcoming(now_epoch_ms(), config.upcoming_days) {
        println!("  {} {}", day.day_start, day.summary);
        for task in &day.tasks {
            println!("    [{}] {} ({})", task.status, task.title, task.id);
        }
    }

    println!("links:");
    for task in tasks.get_all() {
        let linked = relations.journals_for_task(&journals, &task.id);
        if linked.is_empty() {
            continue;
        }
        let paths: Vec<&str> = linked.iter().map(|journal| journal.path.as_str()).collect();
        println!("  {} -> {}", task.title, paths.join(", "));
    }
    Ok(())
}

// Folders are printed expanded regardless of their view state.
fn print_elements(elements: &[TreeElement], depth: usize) {
    for element in elements {
        let name = if element.is_folder() {
            format!("{}/", element.name)
        } else {
            element.name.clone()
        };
        println!("{}{name}", "  ".repeat(depth));
        print_elements(&element.children, depth + 1);
    }
}
