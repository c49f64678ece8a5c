//! Stop-to-line membership derivation.
//!
//! Every stop is projected onto every line's shape; a membership is kept iff
//! the stop lies within the line mode's threshold. The set is always rebuilt
//! in full.

use std::cmp::Ordering;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{Line, Membership, Stop};
use crate::geomath::project_point_to_parts;

use super::config::NetworkBuilderConfig;

/// Canonical membership order: by line, then along the line, then by stop.
pub fn membership_order(a: &Membership, b: &Membership) -> Ordering {
    a.line_id
        .cmp(&b.line_id)
        .then_with(|| a.projected_distance_meters.total_cmp(&b.projected_distance_meters))
        .then_with(|| a.stop_id.cmp(&b.stop_id))
}

/// Memberships of one line.
fn memberships_for_line(line: &Line, stops: &[Stop], threshold: f64) -> Vec<Membership> {
    stops
        .iter()
        .filter_map(|stop| {
            let projection = project_point_to_parts(stop.location, line.shape.parts())?;
            (projection.distance_to_shape_meters <= threshold).then(|| Membership {
                line_id: line.id.clone(),
                stop_id: stop.id.clone(),
                distance_to_shape_meters: projection.distance_to_shape_meters,
                projected_distance_meters: projection.projected_distance_meters,
            })
        })
        .collect()
}

fn memberships_for_lines(
    lines: &[Line],
    stops: &[Stop],
    config: &NetworkBuilderConfig,
) -> Vec<Membership> {
    lines
        .iter()
        .flat_map(|line| memberships_for_line(line, stops, config.threshold_for(line.mode)))
        .collect()
}

/// Derive the full membership set for a network.
///
/// Large networks are split by line across a rayon pool of at most
/// `max_threads` workers. The result is sorted with [`membership_order`], so
/// it does not depend on input order or on how the work was split.
pub fn derive_memberships(
    stops: &[Stop],
    lines: &[Line],
    config: &NetworkBuilderConfig,
) -> Vec<Membership> {
    let pairs = stops.len().saturating_mul(lines.len());
    let threads = config.max_threads.clamp(1, lines.len().max(1));

    let mut memberships = if pairs < config.parallel_min_pairs || threads == 1 {
        memberships_for_lines(lines, stops, config)
    } else {
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| {
                lines
                    .par_iter()
                    .flat_map_iter(|line| {
                        memberships_for_line(line, stops, config.threshold_for(line.mode))
                    })
                    .collect()
            }),
            Err(e) => {
                warn!(error = %e, "membership worker pool unavailable; deriving sequentially");
                memberships_for_lines(lines, stops, config)
            }
        }
    };

    memberships.sort_by(membership_order);
    debug!(
        stops = stops.len(),
        lines = lines.len(),
        pairs,
        threads,
        memberships = memberships.len(),
        "memberships derived"
    );
    memberships
}
