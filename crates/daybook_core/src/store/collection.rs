//! Persisted whole-collection container with explicit subscribers.
//!
//! # Invariants
//! - The in-memory value always equals the last snapshot written or loaded.
//! - `set` persists before it replaces the in-memory value, so a failed
//!   write leaves both unchanged.
//! - Subscribers run synchronously, in subscription order, after each write.

use crate::repo::snapshot_repo::{RepoError, SnapshotStorage};
use log::{debug, error};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle returned by [`PersistentCollection::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Subscriber<T> = Box<dyn Fn(&[T])>;

/// Errors raised while loading or writing a snapshot.
#[derive(Debug)]
pub enum StoreError {
    Repo(RepoError),
    Encode {
        key: String,
        source: serde_json::Error,
    },
    Decode {
        key: String,
        source: serde_json::Error,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Encode { key, source } => {
                write!(f, "failed to encode snapshot `{key}`: {source}")
            }
            Self::Decode { key, source } => {
                write!(f, "failed to decode snapshot `{key}`: {source}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Encode { source, .. } | Self::Decode { source, .. } => Some(source),
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// One named collection persisted as a JSON array snapshot.
pub struct PersistentCollection<T, S: SnapshotStorage> {
    key: String,
    storage: S,
    items: Vec<T>,
    subscribers: Vec<(SubscriptionId, Subscriber<T>)>,
    next_subscription: u64,
}

impl<T, S> PersistentCollection<T, S>
where
    T: Serialize + DeserializeOwned,
    S: SnapshotStorage,
{
    /// Opens `key`, starting empty when nothing has been stored yet.
    pub fn open(storage: S, key: impl Into<String>) -> StoreResult<Self> {
        Self::open_with_default(storage, key, Vec::new())
    }

    /// Opens `key`, starting from `default` when nothing has been stored yet.
    ///
    /// The default is not written until the first `set`.
    pub fn open_with_default(
        storage: S,
        key: impl Into<String>,
        default: Vec<T>,
    ) -> StoreResult<Self> {
        let key = key.into();
        let items = match storage.load(&key)? {
            Some(json) => serde_json::from_str(&json).map_err(|source| {
                error!(
                    "event=snapshot_load module=store status=error key={} error_code=decode_failed",
                    key
                );
                StoreError::Decode {
                    key: key.clone(),
                    source,
                }
            })?,
            None => default,
        };
        debug!(
            "event=snapshot_load module=store status=ok key={} items={}",
            key,
            items.len()
        );

        Ok(Self {
            key,
            storage,
            items,
            subscribers: Vec::new(),
            next_subscription: 0,
        })
    }

    /// Current value.
    pub fn get(&self) -> &[T] {
        &self.items
    }

    /// Storage key of this collection.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replaces the whole collection, persists it and notifies subscribers.
    pub fn set(&mut self, items: Vec<T>) -> StoreResult<()> {
        let json = serde_json::to_string(&items).map_err(|source| StoreError::Encode {
            key: self.key.clone(),
            source,
        })?;
        self.storage.save(&self.key, &json)?;
        self.items = items;
        debug!(
            "event=snapshot_save module=store status=ok key={} items={} subscribers={}",
            self.key,
            self.items.len(),
            self.subscribers.len()
        );

        for (_, subscriber) in &self.subscribers {
            subscriber(&self.items);
        }
        Ok(())
    }

    /// Registers a change listener invoked after every successful `set`.
    pub fn subscribe(&mut self, callback: impl Fn(&[T]) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Removes a listener; returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(current, _)| *current != id);
        self.subscribers.len() != before
    }
}

impl<T: Debug, S: SnapshotStorage> Debug for PersistentCollection<T, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCollection")
            .field("key", &self.key)
            .field("items", &self.items)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
