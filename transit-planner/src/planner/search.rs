//! Direct and one-transfer route search.
//!
//! Answers "how do I get from stop A to stop B" over a stop/line graph:
//!
//! 1. Lines serving both stops give direct options. If there are any, they
//!    are the whole answer.
//! 2. Otherwise every (line at A, line at B) pair is tried: through shared
//!    stops first, and failing that through the nearest walkable pair of
//!    stops.
//!
//! Estimates are pure functions of geometry and per-mode constants, so the
//! same graph and query always give the same answer.

use tracing::{debug, trace};

use crate::domain::{
    DirectOption, ItineraryOption, Line, LineId, Membership, Stop, StopId, TransferOption,
};
use crate::geomath::distance_meters;

use super::config::PlannerConfig;
use super::index::NetworkIndex;
use super::profile::meters_per_minute;
use super::rank::{deduplicate_transfers, into_itineraries, rank_options};

/// Error from route search.
///
/// An unknown stop or a query with no route is not an error; those give an
/// empty option list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// The graph violates its own invariants
    #[error("malformed graph: {0}")]
    MalformedGraph(String),
}

/// Where a transfer happens: alight at `from`, walk, board at `to`.
#[derive(Debug, Clone, Copy)]
struct TransferPoint<'a> {
    from: &'a Stop,
    to: &'a Stop,
    walk_meters: f64,
}

impl<'a> TransferPoint<'a> {
    /// Change at a stop served by both lines.
    fn at(stop: &'a Stop) -> Self {
        Self {
            from: stop,
            to: stop,
            walk_meters: 0.0,
        }
    }
}

/// The route planner.
///
/// Stateless apart from its configuration; every query gets the full graph.
#[derive(Debug, Clone, Default)]
pub struct RoutePlanner {
    config: PlannerConfig,
}

impl RoutePlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Find ranked itinerary options between two stops.
    ///
    /// Returns an empty list when the stops are equal, either stop is
    /// unknown or unserved, or no direct or one-transfer route exists.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::MalformedGraph`] if a membership references a
    /// stop or line absent from `stops` or `lines`.
    pub fn find_options(
        &self,
        start: &StopId,
        end: &StopId,
        stops: &[Stop],
        lines: &[Line],
        memberships: &[Membership],
    ) -> Result<Vec<ItineraryOption>, PlanError> {
        let index = NetworkIndex::new(stops, lines, memberships)?;
        Ok(self.find_options_indexed(&index, start, end))
    }

    /// Same as [`find_options`](Self::find_options), over a prepared index.
    pub fn find_options_indexed(
        &self,
        index: &NetworkIndex<'_>,
        start: &StopId,
        end: &StopId,
    ) -> Vec<ItineraryOption> {
        if start == end {
            return Vec::new();
        }
        let (Some(start_stop), Some(end_stop)) = (index.stop(start), index.stop(end)) else {
            debug!(%start, %end, "unknown stop in route query");
            return Vec::new();
        };
        if !index.is_served(start) || !index.is_served(end) {
            return Vec::new();
        }

        let direct = self.direct_options(index, start_stop, end_stop);
        if !direct.is_empty() {
            debug!(%start, %end, options = direct.len(), "direct options found");
            return into_itineraries(rank_options(direct, self.config.max_results));
        }

        let transfers = deduplicate_transfers(self.transfer_options(index, start_stop, end_stop));
        debug!(%start, %end, options = transfers.len(), "transfer options found");
        into_itineraries(rank_options(transfers, self.config.max_results))
    }

    /// One option per line serving both stops.
    fn direct_options(
        &self,
        index: &NetworkIndex<'_>,
        start: &Stop,
        end: &Stop,
    ) -> Vec<DirectOption> {
        let end_lines: Vec<&LineId> = index.lines_at(&end.id).collect();

        index
            .lines_at(&start.id)
            .filter(|line_id| end_lines.contains(line_id))
            .filter_map(|line_id| index.line(line_id))
            .map(|line| {
                let profile = self.config.profile(line.mode);
                let distance = profile.ride_distance_meters(start.location, end.location);
                DirectOption {
                    line_id: line.id.clone(),
                    mode: line.mode,
                    estimated_distance_meters: distance,
                    estimated_minutes: profile.ride_minutes(distance)
                        + profile.expected_wait_minutes(),
                    headway_minutes: profile.headway_minutes,
                }
            })
            .collect()
    }

    /// Options changing once between a line at `start` and a line at `end`.
    fn transfer_options(
        &self,
        index: &NetworkIndex<'_>,
        start: &Stop,
        end: &Stop,
    ) -> Vec<TransferOption> {
        let mut options = Vec::new();

        for first_id in index.lines_at(&start.id) {
            for second_id in index.lines_at(&end.id) {
                if first_id == second_id {
                    continue;
                }
                let (Some(first), Some(second)) = (index.line(first_id), index.line(second_id))
                else {
                    continue;
                };

                let common = index.common_stops(first_id, second_id);
                if common.is_empty() {
                    match self.nearest_pair(index, first_id, second_id) {
                        Some(point) if point.walk_meters <= self.config.max_walk_meters => {
                            options.push(self.transfer(start, end, first, second, point));
                        }
                        Some(point) => {
                            trace!(
                                first = %first_id,
                                second = %second_id,
                                walk = point.walk_meters,
                                "nearest stops too far apart to transfer"
                            );
                        }
                        None => {}
                    }
                } else {
                    options.extend(
                        common
                            .into_iter()
                            .take(self.config.transfer_sample_limit)
                            .filter_map(|stop_id| index.stop(stop_id))
                            .map(|stop| self.transfer(start, end, first, second, TransferPoint::at(stop))),
                    );
                }
            }
        }

        options
    }

    /// Closest (first line stop, second line stop) pair by great-circle
    /// distance. The first pair found wins ties.
    fn nearest_pair<'a>(
        &self,
        index: &NetworkIndex<'a>,
        first: &LineId,
        second: &LineId,
    ) -> Option<TransferPoint<'a>> {
        let mut best: Option<TransferPoint<'a>> = None;

        for from in index.stops_on(first).iter().filter_map(|id| index.stop(id)) {
            for to in index.stops_on(second).iter().filter_map(|id| index.stop(id)) {
                let walk_meters = distance_meters(from.location, to.location);
                if best.is_none_or(|b| walk_meters < b.walk_meters) {
                    best = Some(TransferPoint {
                        from,
                        to,
                        walk_meters,
                    });
                }
            }
        }

        best
    }

    /// Build one transfer option: ride, optional walk, ride.
    fn transfer(
        &self,
        start: &Stop,
        end: &Stop,
        first: &Line,
        second: &Line,
        point: TransferPoint<'_>,
    ) -> TransferOption {
        let TransferPoint {
            from,
            to,
            walk_meters,
        } = point;
        let first_profile = self.config.profile(first.mode);
        let second_profile = self.config.profile(second.mode);

        let first_leg = first_profile.ride_distance_meters(start.location, from.location);
        let second_leg = second_profile.ride_distance_meters(to.location, end.location);

        let minutes = first_profile.ride_minutes(first_leg)
            + walk_meters / meters_per_minute(self.config.walking_speed_kmh)
            + second_profile.ride_minutes(second_leg)
            + self.config.transfer_penalty_minutes
            + first_profile.expected_wait_minutes()
            + second_profile.expected_wait_minutes();

        TransferOption {
            first_line_id: first.id.clone(),
            second_line_id: second.id.clone(),
            transfer_from_stop_id: from.id.clone(),
            transfer_to_stop_id: to.id.clone(),
            walking_distance_meters: walk_meters,
            total_distance_meters: first_leg + walk_meters + second_leg,
            estimated_minutes: minutes,
        }
    }
}
