//! Multi-part line geometry.

use serde::{Deserialize, Serialize};

use super::{DomainError, Point};
use crate::geomath;

/// Whether the parts of a geometry are open paths or closed rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Polyline,
    Polygon,
}

/// The shape of a line: ordered parts, each an ordered run of points.
///
/// # Invariants
///
/// - At least one part.
/// - Every part has at least 2 points.
///
/// Part order and point order are kept exactly as the source gave them,
/// since distance along the line is measured in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeometryParts")]
pub struct Geometry {
    kind: GeometryKind,
    parts: Vec<Vec<Point>>,
}

/// Unchecked wire form of [`Geometry`].
#[derive(Deserialize)]
struct GeometryParts {
    kind: GeometryKind,
    parts: Vec<Vec<Point>>,
}

impl TryFrom<GeometryParts> for Geometry {
    type Error = DomainError;

    fn try_from(raw: GeometryParts) -> Result<Self, Self::Error> {
        Self::from_parts(raw.kind, raw.parts).map(|(geometry, _)| geometry)
    }
}

impl Geometry {
    /// Build a geometry, dropping parts that cannot form a segment.
    ///
    /// Returns the geometry and the number of parts dropped.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DegenerateGeometry`] if no part has 2 or more
    /// points.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_planner::domain::{Geometry, GeometryKind, Point};
    ///
    /// let parts = vec![
    ///     vec![Point::new(40.0, 44.0)],
    ///     vec![Point::new(40.0, 44.0), Point::new(40.01, 44.0)],
    /// ];
    /// let (geometry, dropped) = Geometry::from_parts(GeometryKind::Polyline, parts).unwrap();
    /// assert_eq!(dropped, 1);
    /// assert_eq!(geometry.parts().len(), 1);
    ///
    /// assert!(Geometry::from_parts(GeometryKind::Polyline, vec![vec![]]).is_err());
    /// ```
    pub fn from_parts(
        kind: GeometryKind,
        parts: Vec<Vec<Point>>,
    ) -> Result<(Self, usize), DomainError> {
        let total = parts.len();
        let parts: Vec<Vec<Point>> = parts.into_iter().filter(|p| p.len() >= 2).collect();
        if parts.is_empty() {
            return Err(DomainError::DegenerateGeometry);
        }
        let dropped = total - parts.len();
        Ok((Self { kind, parts }, dropped))
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn parts(&self) -> &[Vec<Point>] {
        &self.parts
    }

    /// Total number of vertices across all parts.
    pub fn point_count(&self) -> usize {
        self.parts.iter().map(Vec::len).sum()
    }

    /// Sum of the lengths of all parts.
    pub fn length_meters(&self) -> f64 {
        self.parts
            .iter()
            .map(|part| geomath::path_length_meters(part))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| Point::new(40.0 + i as f64 * 0.001, 44.5))
            .collect()
    }

    #[test]
    fn keeps_valid_parts_in_order() {
        let parts = vec![part(3), part(1), part(2)];
        let (geometry, dropped) = Geometry::from_parts(GeometryKind::Polygon, parts).unwrap();

        assert_eq!(dropped, 1);
        assert_eq!(geometry.kind(), GeometryKind::Polygon);
        assert_eq!(geometry.parts().len(), 2);
        assert_eq!(geometry.parts()[0].len(), 3);
        assert_eq!(geometry.parts()[1].len(), 2);
        assert_eq!(geometry.point_count(), 5);
    }

    #[test]
    fn rejects_all_degenerate() {
        let err = Geometry::from_parts(GeometryKind::Polyline, vec![part(1), part(0)]).unwrap_err();
        assert!(matches!(err, DomainError::DegenerateGeometry));
        assert!(Geometry::from_parts(GeometryKind::Polyline, vec![]).is_err());
    }

    #[test]
    fn length_sums_parts() {
        let (geometry, _) =
            Geometry::from_parts(GeometryKind::Polyline, vec![part(2), part(2)]).unwrap();
        let one = geomath::path_length_meters(&part(2));
        assert!((geometry.length_meters() - 2.0 * one).abs() < 1e-6);
    }

    #[test]
    fn deserialize_enforces_invariants() {
        let ok: Geometry = serde_json::from_str(
            r#"{"kind":"polyline","parts":[[{"lat":40.0,"lng":44.5}],[{"lat":40.0,"lng":44.5},{"lat":40.1,"lng":44.5}]]}"#,
        )
        .unwrap();
        assert_eq!(ok.parts().len(), 1);

        let bad = serde_json::from_str::<Geometry>(r#"{"kind":"polygon","parts":[]}"#);
        assert!(bad.is_err());
    }
}
