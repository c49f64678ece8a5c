//! Persistent storage of the built network.
//!
//! The store holds exactly one network at a time and replaces it whole.
//! Reads hand out an `Arc` to an immutable [`NetworkSnapshot`], so a reader
//! never sees stops from one sync and memberships from another.

mod error;
mod file;
mod memory;
mod snapshot;

use std::sync::Arc;

use crate::domain::{Line, Membership, Stop};

pub use error::StoreError;
pub use file::JsonFileStore;
pub use memory::InMemoryStore;
pub use snapshot::{NetworkSnapshot, SyncMetadata};

/// Storage for the current network.
///
/// Implementations only need to replace and hand out snapshots; the query
/// methods read from [`snapshot`](Self::snapshot).
pub trait NetworkStore: Send + Sync {
    /// Atomically replace the whole network. Returns the new version.
    fn replace_network(&self, snapshot: NetworkSnapshot) -> Result<u64, StoreError>;

    /// The current network.
    fn snapshot(&self) -> Result<Arc<NetworkSnapshot>, StoreError>;

    /// Stops whose name starts with `query`, ignoring case, sorted by name.
    fn find_stops_by_name_prefix(&self, query: &str, limit: usize) -> Result<Vec<Stop>, StoreError> {
        Ok(self.snapshot()?.stops_by_name_prefix(query, limit))
    }

    fn get_all_stops(&self) -> Result<Vec<Stop>, StoreError> {
        Ok(self.snapshot()?.stops.clone())
    }

    fn get_all_lines(&self) -> Result<Vec<Line>, StoreError> {
        Ok(self.snapshot()?.lines.clone())
    }

    fn get_all_memberships(&self) -> Result<Vec<Membership>, StoreError> {
        Ok(self.snapshot()?.memberships.clone())
    }

    /// Metadata of the last stored sync, if any.
    fn sync_metadata(&self) -> Result<Option<SyncMetadata>, StoreError> {
        Ok(self.snapshot()?.metadata.clone())
    }
}
