//! Repository error types.

use crate::planner::PlanError;
use crate::source::SourceError;
use crate::store::StoreError;

/// Errors that can occur while syncing the network.
///
/// A failed sync never changes the stored network.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The feature source failed for a layer or for discovery
    #[error("feature source failed: {0}")]
    Source(#[from] SourceError),

    /// The new network could not be stored
    #[error("store failed: {0}")]
    Store(#[from] StoreError),

    /// A newer sync started before this one could commit
    #[error("sync {generation} superseded by sync {latest}")]
    Superseded { generation: u64, latest: u64 },

    /// The network build task panicked or was cancelled
    #[error("network build task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Errors that can occur while answering a query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("store failed: {0}")]
    Store(#[from] StoreError),

    /// The stored graph violates its invariants
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// The planner task panicked or was cancelled
    #[error("route search task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
