//! Network construction.
//!
//! Raw stop and line features become a deduplicated set of [`Stop`]s and
//! [`Line`]s, and stop-to-line [`Membership`]s are derived by projecting
//! every stop onto every line's shape.
//!
//! The pipeline is:
//!
//! 1. Normalize coordinates to WGS-84 (inverse Web-Mercator if needed)
//! 2. Assign stable ids from source layer + object id
//! 3. Pick display names from prioritized attribute keys
//! 4. Collapse duplicates by id
//! 5. Derive memberships within a mode-dependent distance threshold
//!
//! [`Stop`]: crate::domain::Stop
//! [`Line`]: crate::domain::Line
//! [`Membership`]: crate::domain::Membership

mod builder;
mod config;
mod membership;
mod naming;
mod normalize;

pub use builder::{BuildReport, BuiltNetwork, NetworkBuilder, SkipReason};
pub use config::NetworkBuilderConfig;
pub use membership::{derive_memberships, membership_order};
pub use naming::{LINE_NAME_KEYS, STOP_NAME_KEYS, find_name};
pub use normalize::normalize_coordinate;
