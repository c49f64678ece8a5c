//! Transit lines.

use serde::{Deserialize, Serialize};

use super::{Geometry, LineId, TransitMode};

/// A transit route, identified by its geometry and mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: LineId,
    pub name: String,
    pub mode: TransitMode,
    pub shape: Geometry,
}

impl Line {
    pub fn new(id: LineId, name: impl Into<String>, mode: TransitMode, shape: Geometry) -> Self {
        Self {
            id,
            name: name.into(),
            mode,
            shape,
        }
    }
}
