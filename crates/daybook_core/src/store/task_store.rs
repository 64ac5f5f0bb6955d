//! Task collection store.
//!
//! # Responsibility
//! - Own the `tasks` snapshot and its change notifications.
//! - Provide the upcoming-days agenda projection used by the calendar.
//!
//! # Invariants
//! - Task ids are unique and non-blank.
//! - `due_at` is persisted truncated to the start of its UTC day.

use crate::model::task::{generate_task_id, NewTask, Task, TaskUpdate};
use crate::model::{now_epoch_ms, start_of_utc_day, MS_PER_DAY};
use crate::repo::snapshot_repo::SnapshotStorage;
use crate::store::collection::{PersistentCollection, StoreError, StoreResult, SubscriptionId};
use crate::store::TaskLookup;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Snapshot key of the task collection.
pub const TASKS_KEY: &str = "tasks";

/// Errors from task store writes.
#[derive(Debug)]
pub enum TaskStoreError {
    /// Caller-provided id is blank.
    InvalidId(String),
    /// Another task already uses this id.
    DuplicateId(String),
    Store(StoreError),
}

impl Display for TaskStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(id) => write!(f, "task id must not be blank: `{id}`"),
            Self::DuplicateId(id) => write!(f, "Task with ID {id} already exists!"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for TaskStoreError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Tasks due on one day of the upcoming agenda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingDay {
    /// Start of the UTC day, epoch milliseconds.
    pub day_start: i64,
    /// `No Upcoming Tasks`, `1 Upcoming Task` or `N Upcoming Tasks`.
    pub summary: String,
    /// Tasks due that day, ordered by due time.
    pub tasks: Vec<Task>,
}

/// Persisted task collection.
#[derive(Debug)]
pub struct TaskStore<S: SnapshotStorage> {
    tasks: PersistentCollection<Task, S>,
}

impl<S: SnapshotStorage> TaskStore<S> {
    /// Loads the task snapshot from `storage`.
    pub fn open(storage: S) -> StoreResult<Self> {
        Ok(Self {
            tasks: PersistentCollection::open(storage, TASKS_KEY)?,
        })
    }

    pub fn get_all(&self) -> &[Task] {
        self.tasks.get()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Task> {
        self.tasks.get().iter().find(|task| task.id == id)
    }

    /// Creates a task, generating an id when none is given.
    pub fn create(&mut self, request: NewTask) -> Result<Task, TaskStoreError> {
        let id = match request.id {
            Some(id) if id.trim().is_empty() => return Err(TaskStoreError::InvalidId(id)),
            Some(id) => id,
            None => generate_task_id(),
        };
        if self.get_by_id(&id).is_some() {
            return Err(TaskStoreError::DuplicateId(id));
        }

        let task = Task {
            id,
            title: request.title,
            description: request.description,
            priority: request.priority,
            status: request.status,
            created_at: now_epoch_ms(),
            due_at: start_of_utc_day(request.due_at),
        };

        let mut next = self.tasks.get().to_vec();
        next.push(task.clone());
        self.tasks.set(next)?;

        info!(
            "event=task_create module=store status=ok task_id={} total={}",
            task.id,
            self.tasks.get().len()
        );
        Ok(task)
    }

    /// Applies a partial update; returns `false` when the id is unknown.
    pub fn update(&mut self, id: &str, update: TaskUpdate) -> Result<bool, TaskStoreError> {
        let mut next = self.tasks.get().to_vec();
        let Some(task) = next.iter_mut().find(|task| task.id == id) else {
            return Ok(false);
        };
        if update.is_empty() {
            return Ok(true);
        }

        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(due_at) = update.due_at {
            task.due_at = start_of_utc_day(due_at);
        }

        self.tasks.set(next)?;
        info!("event=task_update module=store status=ok task_id={id}");
        Ok(true)
    }

    /// Removes a task; returns whether one was removed.
    ///
    /// Relation pairs pointing at the task are left in place.
    pub fn delete(&mut self, id: &str) -> Result<bool, TaskStoreError> {
        let before = self.tasks.get().len();
        let next: Vec<Task> = self
            .tasks
            .get()
            .iter()
            .filter(|task| task.id != id)
            .cloned()
            .collect();
        if next.len() == before {
            return Ok(false);
        }

        self.tasks.set(next)?;
        info!("event=task_delete module=store status=ok task_id={id}");
        Ok(true)
    }

    /// Removes every task in `status`; returns how many were removed.
    pub fn delete_by_status(&mut self, status: &str) -> Result<usize, TaskStoreError> {
        let before = self.tasks.get().len();
        let next: Vec<Task> = self
            .tasks
            .get()
            .iter()
            .filter(|task| task.status != status)
            .cloned()
            .collect();
        let removed = before - next.len();
        if removed == 0 {
            return Ok(0);
        }

        self.tasks.set(next)?;
        info!("event=task_delete_status module=store status=ok task_status={status} removed={removed}");
        Ok(removed)
    }

    /// Groups tasks due on each of the `days` days after `now_ms`.
    ///
    /// Always returns exactly `days` entries, tomorrow first.
    pub fn upcoming(&self, now_ms: i64, days: u32) -> Vec<UpcomingDay> {
        let today = start_of_utc_day(now_ms);
        let mut sorted: Vec<&Task> = self.tasks.get().iter().collect();
        sorted.sort_by_key(|task| task.due_at);

        (1..=i64::from(days))
            .map(|offset| {
                let day_start = today + offset * MS_PER_DAY;
                let tasks: Vec<Task> = sorted
                    .iter()
                    .filter(|task| start_of_utc_day(task.due_at) == day_start)
                    .map(|task| (*task).clone())
                    .collect();
                UpcomingDay {
                    day_start,
                    summary: upcoming_summary(tasks.len()),
                    tasks,
                }
            })
            .collect()
    }

    pub fn subscribe(&mut self, callback: impl Fn(&[Task]) + 'static) -> SubscriptionId {
        self.tasks.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.tasks.unsubscribe(id)
    }
}

impl<S: SnapshotStorage> TaskLookup for TaskStore<S> {
    fn task_by_id(&self, id: &str) -> Option<&Task> {
        self.get_by_id(id)
    }
}

fn upcoming_summary(count: usize) -> String {
    match count {
        0 => "No Upcoming Tasks".to_string(),
        1 => "1 Upcoming Task".to_string(),
        n => format!("{n} Upcoming Tasks"),
    }
}

#[cfg(test)]
mod tests {
    use super::{TaskStore, TaskStoreError};
    use crate::model::task::{NewTask, TaskUpdate};
    use crate::model::MS_PER_DAY;
    use crate::repo::snapshot_repo::MemorySnapshotStorage;

    const NOW: i64 = 1_717_900_000_000;

    fn store() -> TaskStore<MemorySnapshotStorage> {
        TaskStore::open(MemorySnapshotStorage::new()).unwrap()
    }

    #[test]
    fn create_truncates_due_date_and_rejects_duplicate_ids() {
        let mut tasks = store();
        let created = tasks
            .create(NewTask::new("Sample", "PLANNED", NOW).with_id("1"))
            .unwrap();
        assert_eq!(created.due_at % MS_PER_DAY, 0);
        assert!(created.due_at <= NOW);

        let err = tasks
            .create(NewTask::new("Other", "PLANNED", NOW).with_id("1"))
            .unwrap_err();
        assert!(matches!(err, TaskStoreError::DuplicateId(ref id) if id == "1"));
        assert_eq!(err.to_string(), "Task with ID 1 already exists!");
    }

    #[test]
    fn create_generates_id_and_rejects_blank_id() {
        let mut tasks = store();
        let created = tasks.create(NewTask::new("Gen", "PLANNED", NOW)).unwrap();
        assert!(created.id.starts_with("task-"));

        let err = tasks
            .create(NewTask::new("Blank", "PLANNED", NOW).with_id("  "))
            .unwrap_err();
        assert!(matches!(err, TaskStoreError::InvalidId(_)));
    }

    #[test]
    fn update_merges_present_fields_only() {
        let mut tasks = store();
        tasks
            .create(NewTask::new("Title", "PLANNED", NOW).with_id("1"))
            .unwrap();

        let updated = tasks
            .update(
                "1",
                TaskUpdate {
                    status: Some("ONGOING".to_string()),
                    ..TaskUpdate::default()
                },
            )
            .unwrap();
        assert!(updated);
        let task = tasks.get_by_id("1").unwrap();
        assert_eq!(task.status, "ONGOING");
        assert_eq!(task.title, "Title");

        assert!(!tasks.update("2", TaskUpdate::default()).unwrap());
    }

    #[test]
    fn delete_reports_removal() {
        let mut tasks = store();
        tasks
            .create(NewTask::new("Title", "PLANNED", NOW).with_id("1"))
            .unwrap();
        assert!(tasks.delete("1").unwrap());
        assert!(!tasks.delete("1").unwrap());
        assert!(tasks.get_all().is_empty());
    }

    #[test]
    fn delete_by_status_keeps_other_columns() {
        let mut tasks = store();
        for (id, status) in [("1", "PLANNED"), ("2", "ABANDONED"), ("3", "ABANDONED")] {
            tasks
                .create(NewTask::new(id, status, NOW).with_id(id))
                .unwrap();
        }
        assert_eq!(tasks.delete_by_status("ABANDONED").unwrap(), 2);
        assert_eq!(tasks.delete_by_status("ABANDONED").unwrap(), 0);
        assert_eq!(tasks.get_all().len(), 1);
        assert_eq!(tasks.get_all()[0].id, "1");
    }

    #[test]
    fn upcoming_groups_next_seven_days() {
        let mut tasks = store();
        for (id, days) in [("a", 1), ("b", 2), ("c", 2), ("d", 8), ("e", 0)] {
            tasks
                .create(NewTask::new(id, "PLANNED", NOW + days * MS_PER_DAY).with_id(id))
                .unwrap();
        }

        let upcoming = tasks.upcoming(NOW, 7);
        assert_eq!(upcoming.len(), 7);
        assert_eq!(upcoming[0].summary, "1 Upcoming Task");
        assert_eq!(upcoming[1].summary, "2 Upcoming Tasks");
        assert_eq!(upcoming[2].summary, "No Upcoming Tasks");
        assert!(upcoming
            .iter()
            .flat_map(|day| day.tasks.iter())
            .all(|task| task.id != "d" && task.id != "e"));
    }
}
