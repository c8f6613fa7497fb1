//! # Key/Value Snapshot Store
//!
//! The actor persists its whole collection as one serialized value under one key.
//! This module defines the store seam ([`KeyValueStore`]), two implementations,
//! and [`SnapshotSlot`], the actor's handle on "its" key.
//!
//! Stores broadcast a [`StoreEvent`] on every write. Each slot carries a unique
//! origin id, so a reader can tell its own writes apart from writes made by
//! another execution context sharing the same store.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write as _};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

/// Identifies the execution context (actor) that wrote a value.
pub type ContextId = u64;

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

const EVENT_CAPACITY: usize = 64;

/// Notification that `key` was written by `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub key: String,
    pub origin: ContextId,
}

/// Errors raised while reading or writing snapshots.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage quota exceeded writing {key}: {size} bytes over a {quota} byte quota")]
    QuotaExceeded { key: String, size: usize, quota: usize },
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("corrupt snapshot under {key}: {reason}")]
    Corrupt { key: String, reason: String },
    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),
}

/// A shared, string-valued key/value store.
///
/// Reads and writes always move whole values; there are no partial updates.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn write(&self, key: &str, value: &str, origin: ContextId) -> Result<(), StoreError>;

    /// Subscribe to write notifications, including the subscriber's own writes.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-process store shared by every context holding the same `Arc`.
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    events: broadcast::Sender<StoreEvent>,
    quota: Option<usize>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: Mutex::new(HashMap::new()),
            events,
            quota: None,
        }
    }

    /// A store that rejects writes once keys plus values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::new()
        }
    }

    /// Overwrite a value without notifying anyone, as an out-of-band writer would.
    pub fn seed(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str, origin: ContextId) -> Result<(), StoreError> {
        {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(quota) = self.quota {
                let others: usize = entries
                    .iter()
                    .filter(|(k, _)| k.as_str() != key)
                    .map(|(k, v)| k.len() + v.len())
                    .sum();
                let size = others + key.len() + value.len();
                if size > quota {
                    return Err(StoreError::QuotaExceeded {
                        key: key.to_string(),
                        size,
                        quota,
                    });
                }
            }
            entries.insert(key.to_string(), value.to_string());
        }
        // No subscribers is fine.
        let _ = self.events.send(StoreEvent {
            key: key.to_string(),
            origin,
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// One JSON file per key under a directory.
///
/// Writes land in a temporary file that is renamed over the old one, so readers
/// never observe a half-written snapshot.
///
/// Notifications are in-process only: they reach the contexts that share this
/// `FileStore` instance. A second `FileStore::open` on the same directory, or
/// another process, sees the other side's writes only when it next reads
/// (at startup or on an explicit reload); the directory is not watched.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    events: broadcast::Sender<StoreEvent>,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self { dir, events })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str, origin: ContextId) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let staging = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&staging)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&staging, &path)?;
        let _ = self.events.send(StoreEvent {
            key: key.to_string(),
            origin,
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

// =============================================================================
// SNAPSHOT SLOT
// =============================================================================

/// One context's view of one key: owns the origin id stamped on its writes.
#[derive(Debug, Clone)]
pub struct SnapshotSlot {
    store: Arc<dyn KeyValueStore>,
    key: String,
    origin: ContextId,
}

impl SnapshotSlot {
    /// Binds `key` in `store` to a fresh, process-unique context id.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            origin: NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn origin(&self) -> ContextId {
        self.origin
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    /// True for writes to this slot's key made by some other context.
    pub fn is_external(&self, event: &StoreEvent) -> bool {
        event.key == self.key && event.origin != self.origin
    }

    /// Reads and decodes the whole collection. `Ok(None)` when nothing was stored yet.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<Vec<T>>, StoreError> {
        let Some(raw) = self.store.read(&self.key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: self.key.clone(),
                reason: e.to_string(),
            })
    }

    /// Encodes and writes the whole collection.
    pub fn save<T: Serialize>(&self, records: &[&T]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(records)?;
        self.store.write(&self.key, &raw, self.origin)
    }
}
