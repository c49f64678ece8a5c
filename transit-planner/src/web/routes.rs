//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{error, info, warn};

use crate::domain::{LineId, StopId};
use crate::repository::{QueryError, SyncError};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stops/search", get(search_stops))
        .route("/api/stops/:id", get(stop_detail))
        .route("/api/lines/:id/stops", get(line_stops))
        .route("/api/routes", get(route_options))
        .route("/api/map", get(map_data))
        .route("/api/sync/status", get(sync_status))
        .route("/api/sync", post(start_sync))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

fn parse_stop_id(raw: &str) -> Result<StopId, AppError> {
    StopId::parse(raw).map_err(|e| AppError::BadRequest {
        message: format!("Invalid stop id: {e}"),
    })
}

/// Search stops by name prefix.
async fn search_stops(
    State(state): State<AppState>,
    Query(req): Query<StopSearchRequest>,
) -> Result<Json<StopSearchResponse>, AppError> {
    let stops = state
        .repository
        .search_stops(&req.q, req.effective_limit())?
        .iter()
        .map(StopResult::from_stop)
        .collect();

    Ok(Json(StopSearchResponse { stops }))
}

/// A stop and the lines serving it.
async fn stop_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StopDetailResponse>, AppError> {
    let id = parse_stop_id(&id)?;
    let not_found = || AppError::NotFound {
        message: format!("Stop {id} not found"),
    };

    let stop = state.repository.stop(&id)?.ok_or_else(not_found)?;
    let lines = state.repository.lines_for_stop(&id)?.ok_or_else(not_found)?;

    Ok(Json(StopDetailResponse {
        stop: StopResult::from_stop(&stop),
        lines: lines.iter().map(LineSummary::from_line).collect(),
    }))
}

/// Stops of a line in order along it.
async fn line_stops(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LineStopsResponse>, AppError> {
    let id = LineId::parse(&id).map_err(|e| AppError::BadRequest {
        message: format!("Invalid line id: {e}"),
    })?;
    let stops = state
        .repository
        .stops_along_line(&id)?
        .ok_or_else(|| AppError::NotFound {
            message: format!("Line {id} not found"),
        })?;

    Ok(Json(LineStopsResponse {
        line_id: id.to_string(),
        stops: stops.iter().map(LineStopResult::from_line_stop).collect(),
    }))
}

/// Ranked route options between two stops.
///
/// Unknown stops and unreachable pairs give an empty option list.
async fn route_options(
    State(state): State<AppState>,
    Query(req): Query<RouteRequest>,
) -> Result<Json<RouteResponse>, AppError> {
    let from = parse_stop_id(&req.from)?;
    let to = parse_stop_id(&req.to)?;
    let options = state.repository.find_route_options(&from, &to).await?;

    Ok(Json(RouteResponse {
        from: from.to_string(),
        to: to.to_string(),
        options,
    }))
}

/// All stops and line shapes.
async fn map_data(State(state): State<AppState>) -> Result<Json<MapResponse>, AppError> {
    let data = state.repository.map_data()?;

    Ok(Json(MapResponse {
        stops: data.stops.iter().map(StopResult::from_stop).collect(),
        lines: data.lines.iter().map(MapLine::from_line).collect(),
    }))
}

/// Metadata of the stored network.
async fn sync_status(State(state): State<AppState>) -> Result<Json<SyncStatusResponse>, AppError> {
    let metadata = state.repository.sync_metadata()?;

    Ok(Json(SyncStatusResponse {
        synced: metadata.is_some(),
        metadata,
    }))
}

/// Start a network sync in the background.
///
/// A sync already in flight is superseded by this one.
async fn start_sync(State(state): State<AppState>) -> (StatusCode, Json<SyncStartedResponse>) {
    let repository = state.repository.clone();
    tokio::spawn(async move {
        match repository.sync().await {
            Ok(report) => info!(version = report.version, "requested sync finished"),
            Err(SyncError::Superseded { .. }) => {}
            Err(e) => warn!(error = %e, "requested sync failed"),
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(SyncStartedResponse { status: "started" }),
    )
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::network::{NetworkBuilder, NetworkBuilderConfig};
    use crate::planner::RoutePlanner;
    use crate::repository::TransportRepository;
    use crate::source::{ConfiguredSource, MockFeatureSource};
    use crate::store::JsonFileStore;
    use tempfile::{TempDir, tempdir};

    async fn synced_state() -> (AppState, TempDir) {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("network.json")).unwrap();
        let repository = TransportRepository::new(
            ConfiguredSource::Mock(MockFeatureSource::new("data/mock_network").unwrap()),
            Arc::new(store),
            NetworkBuilder::new(NetworkBuilderConfig::default()),
            RoutePlanner::default(),
        );
        repository.sync().await.unwrap();
        (AppState::new(Arc::new(repository)), dir)
    }

    #[test]
    fn error_status_codes() {
        let status = |e: AppError| e.into_response().status();
        assert_eq!(
            status(AppError::BadRequest {
                message: "bad".into()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AppError::NotFound {
                message: "gone".into()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(AppError::Internal {
                message: "boom".into()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn search_handler_returns_matches() {
        let (state, _dir) = synced_state().await;
        let Json(response) = search_stops(
            State(state),
            Query(StopSearchRequest {
                q: "kom".to_string(),
                limit: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.stops.len(), 1);
        assert_eq!(response.stops[0].name, "Komitas");
    }

    #[tokio::test]
    async fn stop_detail_handles_unknown_and_invalid_ids() {
        let (state, _dir) = synced_state().await;

        let Json(detail) = stop_detail(
            State(state.clone()),
            Path("Transport_Metro_MapServer_0:3".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(detail.lines.len(), 2);

        let missing = stop_detail(State(state.clone()), Path("nowhere".to_string())).await;
        assert!(matches!(missing, Err(AppError::NotFound { .. })));

        let invalid = stop_detail(State(state), Path("has space".to_string())).await;
        assert!(matches!(invalid, Err(AppError::BadRequest { .. })));
    }

    #[tokio::test]
    async fn route_handler_returns_options() {
        let (state, _dir) = synced_state().await;
        let Json(response) = route_options(
            State(state),
            Query(RouteRequest {
                from: "Transport_Metro_MapServer_0:1".to_string(),
                to: "Transport_Bus_MapServer_0:12".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.options.len(), 2);
        assert!(response.options.iter().all(|o| !o.is_direct()));
    }

    #[tokio::test]
    async fn status_and_map_after_sync() {
        let (state, _dir) = synced_state().await;

        let Json(status) = sync_status(State(state.clone())).await.unwrap();
        assert!(status.synced);
        assert_eq!(status.metadata.unwrap().stop_count, 6);

        let Json(map) = map_data(State(state.clone())).await.unwrap();
        assert_eq!(map.stops.len(), 6);
        assert_eq!(map.lines.len(), 2);

        let Json(line) = line_stops(
            State(state),
            Path("Transport_Bus_MapServer_1:5".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(line.stops.len(), 4);
    }
}
