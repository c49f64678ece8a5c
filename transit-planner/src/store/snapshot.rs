//! The stored network and its sync metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Line, Membership, Stop};

/// What the last successful sync produced, and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMetadata {
    pub source_id: String,
    pub synced_at: DateTime<Utc>,
    pub stop_count: usize,
    pub line_count: usize,
    pub membership_count: usize,
}

impl SyncMetadata {
    /// Metadata for a network synced from `source_id` at `synced_at`.
    pub fn describe(
        source_id: impl Into<String>,
        synced_at: DateTime<Utc>,
        stops: &[Stop],
        lines: &[Line],
        memberships: &[Membership],
    ) -> Self {
        Self {
            source_id: source_id.into(),
            synced_at,
            stop_count: stops.len(),
            line_count: lines.len(),
            membership_count: memberships.len(),
        }
    }
}

/// A complete, immutable network: everything the planner needs.
///
/// Snapshots are replaced whole; readers hold an `Arc` to the one they
/// started with and never see a mix of two syncs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub stops: Vec<Stop>,
    pub lines: Vec<Line>,
    pub memberships: Vec<Membership>,
    /// `None` until the first sync completes.
    pub metadata: Option<SyncMetadata>,
    /// Assigned by the store on every replace; 0 for the empty network.
    #[serde(default)]
    pub version: u64,
}

impl NetworkSnapshot {
    /// A freshly synced network. The store assigns the version.
    pub fn new(
        stops: Vec<Stop>,
        lines: Vec<Line>,
        memberships: Vec<Membership>,
        source_id: impl Into<String>,
        synced_at: DateTime<Utc>,
    ) -> Self {
        let metadata = SyncMetadata::describe(source_id, synced_at, &stops, &lines, &memberships);
        Self {
            stops,
            lines,
            memberships,
            metadata: Some(metadata),
            version: 0,
        }
    }

    /// True if no sync has ever been stored.
    pub fn is_empty(&self) -> bool {
        self.metadata.is_none()
    }

    /// Stops whose name starts with `query`, ignoring case, sorted by name.
    ///
    /// A blank query matches nothing.
    pub fn stops_by_name_prefix(&self, query: &str, limit: usize) -> Vec<Stop> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<&Stop> = self
            .stops
            .iter()
            .filter(|stop| stop.name.to_lowercase().starts_with(&needle))
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        matches.into_iter().take(limit).cloned().collect()
    }
}
