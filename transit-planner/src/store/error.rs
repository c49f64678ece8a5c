//! Store error types.

use std::path::PathBuf;

/// Errors that can occur when reading or replacing the stored network.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the snapshot file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot could not be encoded or decoded
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A writer panicked while holding the snapshot lock
    #[error("network store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
