//! Stop-to-line membership.

use serde::{Deserialize, Serialize};

use super::{LineId, StopId};

/// Derived fact that a line serves a stop.
///
/// Memberships are computed by projecting the stop onto the line's shape;
/// they are never authored directly and are rebuilt from scratch whenever
/// the network is re-synced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub line_id: LineId,
    pub stop_id: StopId,
    /// Distance from the stop to the nearest point on the line's shape.
    pub distance_to_shape_meters: f64,
    /// Position of that nearest point along the shape, usable for ordering
    /// the stops of one line.
    pub projected_distance_meters: f64,
}
