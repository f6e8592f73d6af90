//! # Snapshot Persistence
//!
//! Optional persistence hook used only at startup and teardown. The
//! snapshot is an ordered list of `(composite key, entry)` pairs;
//! load/save failures are logged and non-fatal — a failed load starts
//! with an empty cache, a failed save is best-effort.

use crate::entry::CacheEntry;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

/// Ordered whole-cache snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheSnapshot<V> {
    /// `(composite key string, entry)` pairs, oldest insertion first.
    pub entries: Vec<(String, CacheEntry<V>)>,
}

impl<V> CacheSnapshot<V> {
    /// An empty snapshot.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

/// Errors from snapshot load/save.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Filesystem failure reading or writing the snapshot target.
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot target exists but does not parse.
    #[error("snapshot is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Port for loading and saving snapshots.
///
/// Only `init()` and `teardown()` call this; persistence is whole-cache,
/// never incremental. Concurrent writers to one snapshot target are
/// unsupported.
#[async_trait]
pub trait SnapshotStore<V>: Send + Sync {
    /// Load the snapshot, or `None` if none has been saved yet.
    async fn load(&self) -> Result<Option<CacheSnapshot<V>>, SnapshotError>;

    /// Save a snapshot, replacing any previous one.
    async fn save(&self, snapshot: &CacheSnapshot<V>) -> Result<(), SnapshotError>;
}

// ============================================================================
// JsonFileSnapshotStore - Production Adapter
// ============================================================================

/// Snapshot adapter persisting JSON to a single file.
///
/// The file name is derived from the configured persistence key, so two
/// mirror instances with different keys do not clobber each other.
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    /// Create an adapter writing to `<dir>/<persistence_key>.json`.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>, persistence_key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{persistence_key}.json")),
        }
    }

    /// The snapshot file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl<V> SnapshotStore<V> for JsonFileSnapshotStore
where
    V: Serialize + DeserializeOwned + Send + Sync,
{
    async fn load(&self) -> Result<Option<CacheSnapshot<V>>, SnapshotError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No snapshot file, starting empty");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot = serde_json::from_slice(&bytes)?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &CacheSnapshot<V>) -> Result<(), SnapshotError> {
        let bytes = serde_json::to_vec(snapshot)?;
        tokio::fs::write(&self.path, bytes).await?;
        debug!(
            path = %self.path.display(),
            entries = snapshot.entries.len(),
            "Snapshot saved"
        );
        Ok(())
    }
}

// ============================================================================
// MemorySnapshotStore - Test Adapter
// ============================================================================

/// In-memory snapshot adapter for tests, with switchable failure modes.
#[derive(Default)]
pub struct MemorySnapshotStore<V> {
    slot: Mutex<Option<CacheSnapshot<V>>>,
    fail_loads: bool,
    fail_saves: bool,
}

impl<V> MemorySnapshotStore<V> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            fail_loads: false,
            fail_saves: false,
        }
    }

    /// Create a store whose `load` always fails.
    #[must_use]
    pub fn failing_loads() -> Self {
        Self {
            slot: Mutex::new(None),
            fail_loads: true,
            fail_saves: false,
        }
    }

    /// Create a store whose `save` always fails.
    #[must_use]
    pub fn failing_saves() -> Self {
        Self {
            slot: Mutex::new(None),
            fail_loads: false,
            fail_saves: true,
        }
    }

    /// Seed the store with a snapshot to be returned by `load`.
    pub fn seed(&self, snapshot: CacheSnapshot<V>) {
        *self.slot.lock().expect("snapshot slot poisoned") = Some(snapshot);
    }

    /// Whether a snapshot has been saved.
    #[must_use]
    pub fn has_snapshot(&self) -> bool {
        self.slot.lock().expect("snapshot slot poisoned").is_some()
    }
}

#[async_trait]
impl<V> SnapshotStore<V> for MemorySnapshotStore<V>
where
    V: Clone + Send + Sync,
{
    async fn load(&self) -> Result<Option<CacheSnapshot<V>>, SnapshotError> {
        if self.fail_loads {
            return Err(SnapshotError::Io(std::io::Error::other("injected load failure")));
        }
        Ok(self.slot.lock().expect("snapshot slot poisoned").clone())
    }

    async fn save(&self, snapshot: &CacheSnapshot<V>) -> Result<(), SnapshotError> {
        if self.fail_saves {
            return Err(SnapshotError::Io(std::io::Error::other("injected save failure")));
        }
        *self.slot.lock().expect("snapshot slot poisoned") = Some(snapshot.clone());
        Ok(())
    }
}
