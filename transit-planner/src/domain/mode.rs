//! Transit modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown transit mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transit mode: {0}")]
pub struct UnknownMode(String);

/// The kind of vehicle serving a line.
///
/// `Transport` is the catch-all for lines whose source layer does not say
/// what runs on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitMode {
    Bus,
    Trolleybus,
    Minibus,
    Metro,
    Monorail,
    Rail,
    Transport,
}

impl TransitMode {
    pub const ALL: [TransitMode; 7] = [
        TransitMode::Bus,
        TransitMode::Trolleybus,
        TransitMode::Minibus,
        TransitMode::Metro,
        TransitMode::Monorail,
        TransitMode::Rail,
        TransitMode::Transport,
    ];

    /// Modes that run on their own guideway rather than on the road network.
    pub fn is_fixed_guideway(self) -> bool {
        matches!(
            self,
            TransitMode::Metro | TransitMode::Monorail | TransitMode::Rail
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransitMode::Bus => "BUS",
            TransitMode::Trolleybus => "TROLLEYBUS",
            TransitMode::Minibus => "MINIBUS",
            TransitMode::Metro => "METRO",
            TransitMode::Monorail => "MONORAIL",
            TransitMode::Rail => "RAIL",
            TransitMode::Transport => "TRANSPORT",
        }
    }
}

impl FromStr for TransitMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        TransitMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == upper)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

impl fmt::Display for TransitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
