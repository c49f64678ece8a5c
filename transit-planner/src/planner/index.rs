//! Lookup tables over a stop/line/membership graph.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::{Line, LineId, Membership, Stop, StopId};

use super::search::PlanError;

/// Borrowed, query-ready view of a network.
///
/// Ordered maps and sets keep every iteration deterministic, so identical
/// inputs always give identical planner output.
#[derive(Debug)]
pub struct NetworkIndex<'a> {
    stops: HashMap<&'a StopId, &'a Stop>,
    lines: HashMap<&'a LineId, &'a Line>,
    lines_by_stop: BTreeMap<&'a StopId, BTreeSet<&'a LineId>>,
    /// Stops of each line, ordered by projected distance then id.
    stops_by_line: BTreeMap<&'a LineId, Vec<&'a StopId>>,
}

impl<'a> NetworkIndex<'a> {
    /// Index a network.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::MalformedGraph`] if a membership references a
    /// stop or line that is not in the graph.
    pub fn new(
        stops: &'a [Stop],
        lines: &'a [Line],
        memberships: &'a [Membership],
    ) -> Result<Self, PlanError> {
        let stops: HashMap<_, _> = stops.iter().map(|s| (&s.id, s)).collect();
        let lines: HashMap<_, _> = lines.iter().map(|l| (&l.id, l)).collect();

        let mut lines_by_stop: BTreeMap<&StopId, BTreeSet<&LineId>> = BTreeMap::new();
        let mut along_line: BTreeMap<&LineId, Vec<(f64, &StopId)>> = BTreeMap::new();

        for membership in memberships {
            if !stops.contains_key(&membership.stop_id) {
                return Err(PlanError::MalformedGraph(format!(
                    "membership references unknown stop {}",
                    membership.stop_id
                )));
            }
            if !lines.contains_key(&membership.line_id) {
                return Err(PlanError::MalformedGraph(format!(
                    "membership references unknown line {}",
                    membership.line_id
                )));
            }

            lines_by_stop
                .entry(&membership.stop_id)
                .or_default()
                .insert(&membership.line_id);
            along_line
                .entry(&membership.line_id)
                .or_default()
                .push((membership.projected_distance_meters, &membership.stop_id));
        }

        let stops_by_line = along_line
            .into_iter()
            .map(|(line, mut members)| {
                members.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
                members.dedup_by(|a, b| a.1 == b.1);
                (line, members.into_iter().map(|(_, stop)| stop).collect())
            })
            .collect();

        Ok(Self {
            stops,
            lines,
            lines_by_stop,
            stops_by_line,
        })
    }

    pub fn stop(&self, id: &StopId) -> Option<&'a Stop> {
        self.stops.get(id).copied()
    }

    pub fn line(&self, id: &LineId) -> Option<&'a Line> {
        self.lines.get(id).copied()
    }

    /// Lines serving a stop, in id order.
    pub fn lines_at(&self, stop: &StopId) -> impl Iterator<Item = &'a LineId> + '_ {
        self.lines_by_stop
            .get(stop)
            .into_iter()
            .flat_map(|lines| lines.iter().copied())
    }

    /// True if any line serves the stop.
    pub fn is_served(&self, stop: &StopId) -> bool {
        self.lines_by_stop.contains_key(stop)
    }

    /// Stops of a line in order along its shape.
    pub fn stops_on(&self, line: &LineId) -> &[&'a StopId] {
        self.stops_by_line
            .get(line)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Stops served by both lines, in order along the first.
    pub fn common_stops(&self, first: &LineId, second: &LineId) -> Vec<&'a StopId> {
        let on_second: BTreeSet<&StopId> = self.stops_on(second).iter().copied().collect();
        self.stops_on(first)
            .iter()
            .copied()
            .filter(|stop| on_second.contains(stop))
            .collect()
    }
}
