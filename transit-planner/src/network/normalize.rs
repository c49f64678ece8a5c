//! Coordinate normalization to WGS-84.

use crate::domain::Point;
use crate::geomath::web_mercator_to_wgs84;
use crate::source::looks_projected;

/// Convert a raw `(x, y)` pair to a geographic point.
///
/// Pairs outside geographic bounds, or flagged as projected by the source,
/// are inverse Web-Mercator projected; everything else is read as
/// `(lng, lat)` degrees.
pub fn normalize_coordinate((x, y): (f64, f64), projected: bool) -> Point {
    if projected || looks_projected(x, y) {
        web_mercator_to_wgs84(x, y)
    } else {
        Point::new(y, x)
    }
}

/// Normalize every vertex of a multi-part geometry.
///
/// Non-finite vertices are dropped. The projected flag applies to the whole
/// feature; individual out-of-bounds vertices are still caught.
pub fn normalize_parts(parts: &[Vec<(f64, f64)>], projected: bool) -> Vec<Vec<Point>> {
    parts
        .iter()
        .map(|part| {
            part.iter()
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .map(|&xy| normalize_coordinate(xy, projected))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geographic_pairs_are_lng_lat() {
        let p = normalize_coordinate((44.5126, 40.1777), false);
        assert_eq!(p, Point::new(40.1777, 44.5126));
    }

    #[test]
    fn out_of_bounds_pairs_are_inverse_projected() {
        let p = normalize_coordinate((4_955_120.0, 4_891_799.0), false);
        assert!((p.lat - 40.1777).abs() < 1e-3);
        assert!((p.lng - 44.5126).abs() < 1e-3);

        // |y| > 90 alone is enough.
        let p = normalize_coordinate((10.0, 200.0), false);
        assert!(p.lat.abs() < 1.0);
    }

    #[test]
    fn projected_flag_forces_inverse_projection() {
        let p = normalize_coordinate((0.0, 0.0), true);
        assert!(p.lat.abs() < 1e-9 && p.lng.abs() < 1e-9);

        let p = normalize_coordinate((111_319.49, 0.0), true);
        assert!((p.lng - 1.0).abs() < 1e-4);
    }

    #[test]
    fn parts_keep_order_and_drop_non_finite() {
        let parts = vec![
            vec![(44.50, 40.17), (f64::NAN, 40.0), (44.51, 40.18)],
            vec![(44.52, 40.19)],
        ];
        let normalized = normalize_parts(&parts, false);

        assert_eq!(normalized.len(), 2);
        assert_eq!(
            normalized[0],
            vec![Point::new(40.17, 44.50), Point::new(40.18, 44.51)]
        );
        assert_eq!(normalized[1].len(), 1);
    }
}
