//! JSON file network store.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use super::memory::InMemoryStore;
use super::{NetworkSnapshot, NetworkStore, StoreError};

/// Persists the snapshot as a JSON file and serves reads from memory.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// old one, so the file always holds a complete snapshot.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    memory: InMemoryStore,
}

impl JsonFileStore {
    /// Open a store, loading the existing snapshot if the file exists.
    ///
    /// A missing file gives an empty store; an unreadable or corrupt file
    /// is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let snapshot = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let snapshot: NetworkSnapshot = serde_json::from_str(&contents)?;
                info!(
                    path = %path.display(),
                    version = snapshot.version,
                    stops = snapshot.stops.len(),
                    "loaded stored network"
                );
                snapshot
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no stored network yet");
                NetworkSnapshot::default()
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        Ok(Self {
            path,
            memory: InMemoryStore::with_snapshot(snapshot),
        })
    }

    /// Get the snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write(&self, snapshot: &NetworkSnapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let json = serde_json::to_vec(snapshot)?;
        let temp = self.temp_path();
        let mut file = File::create(&temp).map_err(|e| StoreError::io(&temp, e))?;
        file.write_all(&json)
            .and_then(|()| file.sync_all())
            .map_err(|e| StoreError::io(&temp, e))?;
        drop(file);
        std::fs::rename(&temp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&temp);
            StoreError::io(&self.path, e)
        })
    }
}

impl NetworkStore for JsonFileStore {
    fn replace_network(&self, snapshot: NetworkSnapshot) -> Result<u64, StoreError> {
        self.memory.commit(snapshot, |versioned| self.write(versioned))
    }

    fn snapshot(&self) -> Result<Arc<NetworkSnapshot>, StoreError> {
        self.memory.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Geometry, GeometryKind, Line, LineId, Membership, Point, Stop, StopId, TransitMode};
    use chrono::Utc;
    use tempfile::tempdir;

    fn network() -> NetworkSnapshot {
        let stop = Stop::new(StopId::parse("s1").unwrap(), "Sasuntsi David", Point::new(40.156, 44.516));
        let (shape, _) = Geometry::from_parts(
            GeometryKind::Polyline,
            vec![vec![Point::new(40.15, 44.51), Point::new(40.16, 44.52)]],
        )
        .unwrap();
        let line = Line::new(LineId::parse("l1").unwrap(), "Line 1", TransitMode::Metro, shape);
        let membership = Membership {
            line_id: line.id.clone(),
            stop_id: stop.id.clone(),
            distance_to_shape_meters: 12.0,
            projected_distance_meters: 640.0,
        };
        NetworkSnapshot::new(vec![stop], vec![line], vec![membership], "mock:test", Utc::now())
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("network.json")).unwrap();
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[test]
    fn replace_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("network.json");

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.replace_network(network()).unwrap(), 1);
        assert!(path.exists());
        assert!(!store.temp_path().exists());

        let reopened = JsonFileStore::open(&path).unwrap();
        let snapshot = reopened.snapshot().unwrap();
        assert_eq!(snapshot.version, 1);
        assert_eq!(*snapshot, *store.snapshot().unwrap());
        assert_eq!(reopened.get_all_memberships().unwrap().len(), 1);

        // Versions continue from the stored one.
        assert_eq!(reopened.replace_network(network()).unwrap(), 2);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("network.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Json(_))));
    }

    #[test]
    fn failed_write_keeps_old_network() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("network.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.replace_network(network()).unwrap();

        // A directory where the temp file should go makes the write fail.
        std::fs::create_dir(store.temp_path()).unwrap();
        let mut next = network();
        next.stops.clear();
        assert!(matches!(store.replace_network(next), Err(StoreError::Io { .. })));

        assert_eq!(store.snapshot().unwrap().version, 1);
        assert_eq!(store.get_all_stops().unwrap().len(), 1);
        let on_disk = JsonFileStore::open(&path).unwrap();
        assert_eq!(on_disk.get_all_stops().unwrap().len(), 1);
    }
}
