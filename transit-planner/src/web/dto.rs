//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{ItineraryOption, Line, Stop, TransitMode};
use crate::repository::LineStop;
use crate::store::SyncMetadata;

/// Default number of stops returned by a name search.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Upper bound on the search limit a client may ask for.
pub const MAX_SEARCH_LIMIT: usize = 50;

/// Request to search stops by name.
#[derive(Debug, Deserialize)]
pub struct StopSearchRequest {
    /// Name prefix, at least two characters after trimming
    pub q: String,

    /// Maximum number of results (defaults to 10, capped at 50)
    pub limit: Option<usize>,
}

impl StopSearchRequest {
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .min(MAX_SEARCH_LIMIT)
    }
}

/// A stop in responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopResult {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

/// Response to a stop name search.
#[derive(Debug, Serialize)]
pub struct StopSearchResponse {
    pub stops: Vec<StopResult>,
}

/// A line without its shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSummary {
    pub id: String,
    pub name: String,
    pub mode: TransitMode,
}

/// A stop together with the lines serving it.
#[derive(Debug, Serialize)]
pub struct StopDetailResponse {
    pub stop: StopResult,
    pub lines: Vec<LineSummary>,
}

/// A stop on a line, with its position along the shape.
#[derive(Debug, Serialize)]
pub struct LineStopResult {
    pub stop: StopResult,
    pub projected_distance_meters: f64,
    pub distance_to_shape_meters: f64,
}

/// Stops of one line in order along it.
#[derive(Debug, Serialize)]
pub struct LineStopsResponse {
    pub line_id: String,
    pub stops: Vec<LineStopResult>,
}

/// Request for route options between two stops.
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    /// Start stop id
    pub from: String,

    /// End stop id
    pub to: String,
}

/// Ranked route options, fastest first.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub from: String,
    pub to: String,
    pub options: Vec<ItineraryOption>,
}

/// A line with its shape as `[lng, lat]` pairs per part.
#[derive(Debug, Serialize)]
pub struct MapLine {
    #[serde(flatten)]
    pub line: LineSummary,
    pub parts: Vec<Vec<[f64; 2]>>,
}

/// Everything a map view draws.
#[derive(Debug, Serialize)]
pub struct MapResponse {
    pub stops: Vec<StopResult>,
    pub lines: Vec<MapLine>,
}

/// State of the stored network.
#[derive(Debug, Serialize)]
pub struct SyncStatusResponse {
    pub synced: bool,
    pub metadata: Option<SyncMetadata>,
}

/// Acknowledges a sync request; the sync runs in the background.
#[derive(Debug, Serialize)]
pub struct SyncStartedResponse {
    pub status: &'static str,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// Conversion implementations

impl StopResult {
    pub fn from_stop(stop: &Stop) -> Self {
        Self {
            id: stop.id.to_string(),
            name: stop.name.clone(),
            lat: stop.location.lat,
            lng: stop.location.lng,
        }
    }
}

impl LineSummary {
    pub fn from_line(line: &Line) -> Self {
        Self {
            id: line.id.to_string(),
            name: line.name.clone(),
            mode: line.mode,
        }
    }
}

impl LineStopResult {
    pub fn from_line_stop(line_stop: &LineStop) -> Self {
        Self {
            stop: StopResult::from_stop(&line_stop.stop),
            projected_distance_meters: line_stop.projected_distance_meters,
            distance_to_shape_meters: line_stop.distance_to_shape_meters,
        }
    }
}

impl MapLine {
    pub fn from_line(line: &Line) -> Self {
        Self {
            line: LineSummary::from_line(line),
            parts: line
                .shape
                .parts()
                .iter()
                .map(|part| part.iter().map(|p| [p.lng, p.lat]).collect())
                .collect(),
        }
    }
}
