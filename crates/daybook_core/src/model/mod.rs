//! Domain records persisted as whole-collection snapshots.
//!
//! # Responsibility
//! - Define the journal, task and relation records shared by the stores.
//! - Keep serialized field names compatible with existing snapshots
//!   (`createdAt`, `dueAt`, `taskId`, ...).
//!
//! # Invariants
//! - Journals are identified by their normalized path.
//! - Tasks are identified by a caller-visible string id.

pub mod journal;
pub mod relation;
pub mod task;

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds in one UTC day.
pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Truncates an epoch-ms timestamp to the start of its UTC day.
pub fn start_of_utc_day(epoch_ms: i64) -> i64 {
    epoch_ms.div_euclid(MS_PER_DAY) * MS_PER_DAY
}
