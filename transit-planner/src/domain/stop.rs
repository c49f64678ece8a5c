//! Transit stops.

use serde::{Deserialize, Serialize};

use super::{Point, StopId};

/// A physical boarding point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub location: Point,
}

impl Stop {
    pub fn new(id: StopId, name: impl Into<String>, location: Point) -> Self {
        Self {
            id,
            name: name.into(),
            location,
        }
    }
}
