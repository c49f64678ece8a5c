//! Stable feature identifiers.
//!
//! Stop and line ids are derived from the source layer and the source object
//! id, never from geometry or names, so re-syncing the same upstream layer
//! yields the same id for the same physical feature.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid feature identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid feature id: {reason}")]
pub struct InvalidId {
    reason: &'static str,
}

/// Build the id token for a feature of a source layer.
///
/// The layer URL is reduced to the path after `/services/` (or kept whole
/// when there is no such segment), and the object id is appended after a
/// `:`. In both parts a non-ASCII character becomes `-u<hex>-` (its code
/// point), so Armenian service names of equal length stay distinct. Any
/// other character outside `[A-Za-z0-9_:-]`, `/` included, becomes `_`;
/// paths that differ only in such punctuation share a token.
fn stable_token(layer_url: &str, object_id: &str) -> String {
    let path = layer_url
        .split_once("/services/")
        .map_or(layer_url, |(_, rest)| rest);
    let mut token = String::with_capacity(path.len() + object_id.len() + 1);
    push_sanitized(&mut token, path);
    token.push(':');
    push_sanitized(&mut token, object_id.trim());
    token
}

fn push_sanitized(token: &mut String, raw: &str) {
    for c in raw.chars() {
        if is_id_char(c) {
            token.push(c);
        } else if c.is_ascii() {
            token.push('_');
        } else {
            token.push_str(&format!("-u{:x}-", u32::from(c)));
        }
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-')
}

fn validate(s: &str) -> Result<(), InvalidId> {
    if s.is_empty() {
        return Err(InvalidId {
            reason: "must not be empty",
        });
    }
    if !s.chars().all(is_id_char) {
        return Err(InvalidId {
            reason: "must only contain A-Z, a-z, 0-9, '_', ':' or '-'",
        });
    }
    Ok(())
}

/// Identifier of a transit stop.
///
/// # Examples
///
/// ```
/// use transit_planner::domain::StopId;
///
/// let id = StopId::from_source(
///     "https://gis.example.am/server/rest/services/Transport/Metro/MapServer/0",
///     "17",
/// );
/// assert_eq!(id.as_str(), "Transport_Metro_MapServer_0:17");
///
/// assert!(StopId::parse("").is_err());
/// assert!(StopId::parse("has space").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StopId(String);

impl StopId {
    /// Derive the stable id of a stop from its source layer and object id.
    pub fn from_source(layer_url: &str, object_id: &str) -> Self {
        Self(stable_token(layer_url, object_id))
    }

    /// Parse an id that was previously produced by [`StopId::from_source`].
    pub fn parse(s: &str) -> Result<Self, InvalidId> {
        validate(s)?;
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StopId {
    type Error = InvalidId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value)?;
        Ok(Self(value))
    }
}

impl From<StopId> for String {
    fn from(id: StopId) -> Self {
        id.0
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a transit line.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineId(String);

impl LineId {
    /// Derive the stable id of a line from its source layer and object id.
    pub fn from_source(layer_url: &str, object_id: &str) -> Self {
        Self(stable_token(layer_url, object_id))
    }

    /// Parse an id that was previously produced by [`LineId::from_source`].
    pub fn parse(s: &str) -> Result<Self, InvalidId> {
        validate(s)?;
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LineId {
    type Error = InvalidId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value)?;
        Ok(Self(value))
    }
}

impl From<LineId> for String {
    fn from(id: LineId) -> Self {
        id.0
    }
}

impl fmt::Debug for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineId({})", self.0)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
