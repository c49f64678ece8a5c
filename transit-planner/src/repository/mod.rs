//! The transport repository: the single entry point the presentation layer
//! talks to.
//!
//! It owns the feature source and the store, runs syncs (fetch, build,
//! atomic replace) and answers queries against the current snapshot.
//! CPU-bound work runs on the blocking pool.

mod error;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::domain::{ItineraryOption, Line, LineId, Stop, StopId};
use crate::network::{BuildReport, NetworkBuilder};
use crate::planner::RoutePlanner;
use crate::source::{FeatureSource, fetch_network};
use crate::store::{NetworkSnapshot, NetworkStore, SyncMetadata};

pub use error::{QueryError, SyncError};

/// Trimmed queries shorter than this return no stops.
pub const MIN_SEARCH_CHARS: usize = 2;

/// How many times a route query is re-run when the network changes under it.
const MAX_QUERY_ATTEMPTS: usize = 3;

/// Outcome of a committed sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub version: u64,
    pub metadata: SyncMetadata,
    pub build: BuildReport,
}

/// A stop as seen from one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStop {
    pub stop: Stop,
    pub projected_distance_meters: f64,
    pub distance_to_shape_meters: f64,
}

/// Everything a map view draws.
#[derive(Debug, Clone, Serialize)]
pub struct MapData {
    pub stops: Vec<Stop>,
    pub lines: Vec<Line>,
}

/// Resolves once a sync newer than `generation` has started.
async fn superseded(mut latest: watch::Receiver<u64>, generation: u64) {
    if latest.wait_for(|&latest| latest != generation).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Repository over a feature source and a network store.
pub struct TransportRepository<S, T> {
    source: S,
    store: Arc<T>,
    builder: NetworkBuilder,
    planner: RoutePlanner,
    /// Incremented when a sync starts; only the latest may commit.
    generation: AtomicU64,
    /// Highest generation started, watched by in-flight fetches.
    latest: watch::Sender<u64>,
    commit: Mutex<()>,
}

impl<S: FeatureSource, T: NetworkStore + 'static> TransportRepository<S, T> {
    pub fn new(source: S, store: Arc<T>, builder: NetworkBuilder, planner: RoutePlanner) -> Self {
        Self {
            source,
            store,
            builder,
            planner,
            generation: AtomicU64::new(0),
            latest: watch::channel(0).0,
            commit: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<T> {
        &self.store
    }

    /// Metadata of the stored network, syncing first if there is none or
    /// `force` is set.
    pub async fn ensure_synced(&self, force: bool) -> Result<SyncMetadata, SyncError> {
        if !force && let Some(metadata) = self.store.sync_metadata()? {
            debug!(synced_at = %metadata.synced_at, "network already synced");
            return Ok(metadata);
        }
        Ok(self.sync().await?.metadata)
    }

    /// Fetch, build and store the whole network.
    ///
    /// Starting a sync supersedes any sync still in flight: the older one
    /// returns [`SyncError::Superseded`] instead of committing. A superseded
    /// sync that is still fetching drops its outstanding layer requests.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest.send_modify(|latest| *latest = (*latest).max(generation));
        let latest = self.latest.subscribe();
        let source_id = self.source.source_id();
        info!(generation, source = %source_id, "network sync started");

        let batches = tokio::select! {
            fetched = fetch_network(&self.source) => fetched.inspect_err(|e| {
                warn!(generation, error = %e, "network sync failed");
            })?,
            () = superseded(latest, generation) => {
                let latest = self.generation.load(Ordering::SeqCst);
                info!(generation, latest, "sync superseded; fetch cancelled");
                return Err(SyncError::Superseded { generation, latest });
            }
        };
        self.check_current(generation)?;

        let builder = self.builder.clone();
        let built = tokio::task::spawn_blocking(move || builder.build(&batches)).await?;

        let _commit = self.commit.lock().await;
        self.check_current(generation)?;

        let metadata = SyncMetadata::describe(
            source_id,
            Utc::now(),
            &built.stops,
            &built.lines,
            &built.memberships,
        );
        let snapshot = NetworkSnapshot {
            stops: built.stops,
            lines: built.lines,
            memberships: built.memberships,
            metadata: Some(metadata.clone()),
            version: 0,
        };
        let store = Arc::clone(&self.store);
        let version = tokio::task::spawn_blocking(move || store.replace_network(snapshot)).await??;

        info!(
            generation,
            version,
            stops = metadata.stop_count,
            lines = metadata.line_count,
            memberships = metadata.membership_count,
            skipped = built.report.skipped_total(),
            "network sync committed"
        );
        Ok(SyncReport {
            version,
            metadata,
            build: built.report,
        })
    }

    fn check_current(&self, generation: u64) -> Result<(), SyncError> {
        let latest = self.generation.load(Ordering::SeqCst);
        if latest == generation {
            Ok(())
        } else {
            info!(generation, latest, "sync superseded; discarding result");
            Err(SyncError::Superseded { generation, latest })
        }
    }

    /// Metadata of the stored network, if any sync has completed.
    pub fn sync_metadata(&self) -> Result<Option<SyncMetadata>, QueryError> {
        Ok(self.store.sync_metadata()?)
    }

    /// Stops whose name starts with `query`.
    pub fn search_stops(&self, query: &str, limit: usize) -> Result<Vec<Stop>, QueryError> {
        if query.trim().chars().count() < MIN_SEARCH_CHARS {
            return Ok(Vec::new());
        }
        Ok(self.store.find_stops_by_name_prefix(query, limit)?)
    }

    /// Ranked itinerary options between two stops.
    ///
    /// The search runs against one snapshot. If a sync commits while it
    /// runs, the result is discarded and the search repeated on the new
    /// network.
    pub async fn find_route_options(
        &self,
        start: &StopId,
        end: &StopId,
    ) -> Result<Vec<ItineraryOption>, QueryError> {
        let mut attempt = 1;
        loop {
            let snapshot = self.store.snapshot()?;
            let version = snapshot.version;
            let planner = self.planner.clone();
            let (from, to) = (start.clone(), end.clone());

            let options = tokio::task::spawn_blocking(move || {
                planner.find_options(
                    &from,
                    &to,
                    &snapshot.stops,
                    &snapshot.lines,
                    &snapshot.memberships,
                )
            })
            .await??;

            let current = self.store.snapshot()?.version;
            if current == version {
                return Ok(options);
            }
            if attempt == MAX_QUERY_ATTEMPTS {
                warn!(%start, %end, version, current, "network kept changing; returning last result");
                return Ok(options);
            }
            debug!(%start, %end, version, current, "network changed during route search; retrying");
            attempt += 1;
        }
    }

    pub fn stop(&self, id: &StopId) -> Result<Option<Stop>, QueryError> {
        let snapshot = self.store.snapshot()?;
        Ok(snapshot.stops.iter().find(|s| &s.id == id).cloned())
    }

    /// Lines serving a stop, in network order. `None` if the stop is unknown.
    pub fn lines_for_stop(&self, id: &StopId) -> Result<Option<Vec<Line>>, QueryError> {
        let snapshot = self.store.snapshot()?;
        if !snapshot.stops.iter().any(|s| &s.id == id) {
            return Ok(None);
        }

        let serving: BTreeSet<&LineId> = snapshot
            .memberships
            .iter()
            .filter(|m| &m.stop_id == id)
            .map(|m| &m.line_id)
            .collect();
        Ok(Some(
            snapshot
                .lines
                .iter()
                .filter(|l| serving.contains(&l.id))
                .cloned()
                .collect(),
        ))
    }

    /// Stops of a line in order along its shape. `None` if the line is
    /// unknown.
    pub fn stops_along_line(&self, id: &LineId) -> Result<Option<Vec<LineStop>>, QueryError> {
        let snapshot = self.store.snapshot()?;
        if !snapshot.lines.iter().any(|l| &l.id == id) {
            return Ok(None);
        }

        let mut along: Vec<LineStop> = snapshot
            .memberships
            .iter()
            .filter(|m| &m.line_id == id)
            .filter_map(|m| {
                let stop = snapshot.stops.iter().find(|s| s.id == m.stop_id)?;
                Some(LineStop {
                    stop: stop.clone(),
                    projected_distance_meters: m.projected_distance_meters,
                    distance_to_shape_meters: m.distance_to_shape_meters,
                })
            })
            .collect();
        along.sort_by(|a, b| {
            a.projected_distance_meters
                .total_cmp(&b.projected_distance_meters)
                .then_with(|| a.stop.id.cmp(&b.stop.id))
        });
        Ok(Some(along))
    }

    /// All stops and line shapes.
    pub fn map_data(&self) -> Result<MapData, QueryError> {
        let snapshot = self.store.snapshot()?;
        Ok(MapData {
            stops: snapshot.stops.clone(),
            lines: snapshot.lines.clone(),
        })
    }
}
