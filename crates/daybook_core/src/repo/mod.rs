//! Snapshot persistence boundary.
//!
//! # Responsibility
//! - Define the key-value contract used to persist whole collections.
//! - Isolate SQLite query details from the in-memory stores.
//!
//! # Invariants
//! - One key maps to one JSON document; writes replace it wholesale.
//! - Keys are non-blank.

pub mod snapshot_repo;
