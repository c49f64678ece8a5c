//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They are
//! distinct from feed, storage and HTTP errors.

use super::{InvalidId, UnknownMode};

/// Domain-level errors for validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A line has no part with at least 2 points
    #[error("geometry has no part with at least 2 points")]
    DegenerateGeometry,

    /// An identifier failed validation
    #[error(transparent)]
    InvalidId(#[from] InvalidId),

    /// A mode name is not one of the known transit modes
    #[error(transparent)]
    UnknownMode(#[from] UnknownMode),
}
