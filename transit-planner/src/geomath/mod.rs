//! Geometric primitives for urban-scale transit geometry.
//!
//! Distances are great-circle (haversine) distances. Projections onto
//! segments are done in a local tangent plane whose longitude axis is
//! scaled by `cos(reference latitude)`, which keeps both axes in comparable
//! meter units near the reference latitude.
//!
//! All functions are pure.

use crate::domain::Point;

/// Mean Earth radius used for all distance computations.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Offset added per part index when projecting onto multi-part geometry.
///
/// Larger than any plausible city line, so projected distances on part `n`
/// always sort after every projected distance on parts `0..n`.
pub const PART_OFFSET_METERS: f64 = 1_000_000.0;

/// Web-Mercator half circumference, in projected meters.
const MERCATOR_HALF_EXTENT: f64 = 20_037_508.34;

/// Squared planar segment length below which a segment is treated as a point.
const DEGENERATE_SEGMENT_SQ_METERS: f64 = 1e-9;

/// Nearest point on a segment, relative to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Planar distance from the query point to the nearest point.
    pub distance_meters: f64,
    /// Position of the nearest point along the segment, in `[0, 1]`.
    pub t: f64,
}

/// Nearest point on a path or multi-part shape, relative to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Distance from the query point to the shape.
    pub distance_to_shape_meters: f64,
    /// Arc length from the start of the shape to the nearest point.
    pub projected_distance_meters: f64,
}

/// Great-circle distance between two points.
pub fn distance_meters(a: Point, b: Point) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Convert a point to local tangent-plane coordinates `(x, y)` in meters.
pub fn project_to_local_plane(point: Point, reference_latitude: f64) -> (f64, f64) {
    let x = EARTH_RADIUS_METERS * point.lng.to_radians() * reference_latitude.to_radians().cos();
    let y = EARTH_RADIUS_METERS * point.lat.to_radians();
    (x, y)
}

/// Inverse Web-Mercator projection to WGS-84 degrees.
pub fn web_mercator_to_wgs84(x: f64, y: f64) -> Point {
    let lng = x / MERCATOR_HALF_EXTENT * 180.0;
    let lat_deg = y / MERCATOR_HALF_EXTENT * 180.0;
    let lat = (2.0 * lat_deg.to_radians().exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    Point::new(lat, lng)
}

/// Project a point onto the finite segment `start..end`.
///
/// The reference latitude for the planar projection is the mean latitude of
/// the three points. The parametric position is clamped to the segment, and
/// a zero-length segment yields the distance to `start` with `t = 0`.
pub fn project_point_to_segment(point: Point, start: Point, end: Point) -> SegmentProjection {
    let reference_latitude = (point.lat + start.lat + end.lat) / 3.0;
    let (px, py) = project_to_local_plane(point, reference_latitude);
    let (sx, sy) = project_to_local_plane(start, reference_latitude);
    let (ex, ey) = project_to_local_plane(end, reference_latitude);

    let (vx, vy) = (ex - sx, ey - sy);
    let (wx, wy) = (px - sx, py - sy);
    let vv = vx * vx + vy * vy;

    if vv <= DEGENERATE_SEGMENT_SQ_METERS {
        return SegmentProjection {
            distance_meters: wx.hypot(wy),
            t: 0.0,
        };
    }

    let t = ((wx * vx + wy * vy) / vv).clamp(0.0, 1.0);
    let (cx, cy) = (sx + t * vx, sy + t * vy);
    SegmentProjection {
        distance_meters: (px - cx).hypot(py - cy),
        t,
    }
}

/// Project a point onto a path of consecutive segments.
///
/// Returns `None` for paths with fewer than 2 points. When several segments
/// are equally near, the first one in path order wins.
pub fn project_point_to_path(point: Point, path: &[Point]) -> Option<Projection> {
    let mut best: Option<Projection> = None;
    let mut walked = 0.0;

    for segment in path.windows(2) {
        let (start, end) = (segment[0], segment[1]);
        let segment_length = distance_meters(start, end);
        let projection = project_point_to_segment(point, start, end);

        if best.is_none_or(|b| projection.distance_meters < b.distance_to_shape_meters) {
            best = Some(Projection {
                distance_to_shape_meters: projection.distance_meters,
                projected_distance_meters: walked + projection.t * segment_length,
            });
        }
        walked += segment_length;
    }

    best
}

/// Project a point onto a multi-part shape.
///
/// The projected distance is globally ordered across parts: on part `i` it
/// is `i * PART_OFFSET_METERS`, plus the lengths of all previous parts, plus
/// the arc length within part `i`. Parts with fewer than 2 points are
/// skipped. Ties resolve to the earliest part.
///
/// Returns `None` if no part has 2 or more points.
pub fn project_point_to_parts(point: Point, parts: &[Vec<Point>]) -> Option<Projection> {
    let mut best: Option<Projection> = None;
    let mut consumed = 0.0;

    for (part_index, part) in parts.iter().enumerate() {
        let Some(projection) = project_point_to_path(point, part) else {
            continue;
        };

        if best.is_none_or(|b| projection.distance_to_shape_meters < b.distance_to_shape_meters) {
            best = Some(Projection {
                distance_to_shape_meters: projection.distance_to_shape_meters,
                projected_distance_meters: part_index as f64 * PART_OFFSET_METERS
                    + consumed
                    + projection.projected_distance_meters,
            });
        }
        consumed += path_length_meters(part);
    }

    best
}

/// Sum of the great-circle lengths of consecutive segments.
pub fn path_length_meters(path: &[Point]) -> f64 {
    path.windows(2).map(|s| distance_meters(s[0], s[1])).sum()
}
