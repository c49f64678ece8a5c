//! In-memory network store.

use std::sync::{Arc, Mutex, RwLock};

use tracing::info;

use super::{NetworkSnapshot, NetworkStore, StoreError};

/// Holds the current snapshot behind an `RwLock<Arc<_>>`.
///
/// Replacements are serialized by a separate writer mutex. The new snapshot
/// is versioned and persisted without touching the `RwLock`, then swapped in
/// under a short write lock, so readers see either the old network or the
/// new one and never wait on persistence.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    current: RwLock<Arc<NetworkSnapshot>>,
    writer: Mutex<()>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot, keeping its version.
    pub fn with_snapshot(snapshot: NetworkSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            writer: Mutex::new(()),
        }
    }

    fn current_version(&self) -> Result<u64, StoreError> {
        self.current
            .read()
            .map(|current| current.version)
            .map_err(|_| StoreError::Poisoned)
    }

    /// Replace the snapshot, running `persist` on the versioned snapshot
    /// before it becomes visible. If `persist` fails nothing changes.
    pub(crate) fn commit<F>(&self, mut snapshot: NetworkSnapshot, persist: F) -> Result<u64, StoreError>
    where
        F: FnOnce(&NetworkSnapshot) -> Result<(), StoreError>,
    {
        let _writer = self.writer.lock().map_err(|_| StoreError::Poisoned)?;
        snapshot.version = self.current_version()? + 1;
        persist(&snapshot)?;

        let version = snapshot.version;
        info!(
            version,
            stops = snapshot.stops.len(),
            lines = snapshot.lines.len(),
            memberships = snapshot.memberships.len(),
            "network replaced"
        );
        let snapshot = Arc::new(snapshot);
        *self.current.write().map_err(|_| StoreError::Poisoned)? = snapshot;
        Ok(version)
    }
}

impl NetworkStore for InMemoryStore {
    fn replace_network(&self, snapshot: NetworkSnapshot) -> Result<u64, StoreError> {
        self.commit(snapshot, |_| Ok(()))
    }

    fn snapshot(&self) -> Result<Arc<NetworkSnapshot>, StoreError> {
        self.current
            .read()
            .map(|current| Arc::clone(&current))
            .map_err(|_| StoreError::Poisoned)
    }
}
