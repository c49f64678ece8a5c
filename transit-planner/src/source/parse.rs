//! Conversion of ArcGIS REST JSON into raw feature records.
//!
//! Parsing is lenient: a feature with missing or unreadable parts is still
//! returned, with the missing pieces set to `None`, so that the network
//! builder can count and skip it.

use serde_json::{Map, Value};

use crate::domain::GeometryKind;

use super::types::{Attributes, RawLineFeature, RawPointFeature};

/// Attribute names probed for the object id when the layer does not declare one.
const FALLBACK_OBJECT_ID_FIELDS: [&str; 4] = ["objectid", "OBJECTID", "fid", "id"];

/// ArcGIS geometry type names.
pub const ESRI_POINT: &str = "esriGeometryPoint";
pub const ESRI_POLYLINE: &str = "esriGeometryPolyline";
pub const ESRI_POLYGON: &str = "esriGeometryPolygon";

/// Render a scalar attribute value as text; `null` becomes `None`.
fn attribute_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Read the `attributes` object of a feature.
pub fn parse_attributes(feature: &Map<String, Value>) -> Attributes {
    feature
        .get("attributes")
        .and_then(Value::as_object)
        .map(|attrs| {
            attrs
                .iter()
                .map(|(k, v)| (k.clone(), attribute_text(v)))
                .collect()
        })
        .unwrap_or_default()
}

/// Pick the object id: the declared field first, then the usual suspects.
pub fn extract_object_id(attributes: &Attributes, object_id_field: Option<&str>) -> Option<String> {
    let non_blank = |key: &str| {
        attributes
            .get(key)
            .cloned()
            .flatten()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    object_id_field
        .and_then(non_blank)
        .or_else(|| FALLBACK_OBJECT_ID_FIELDS.into_iter().find_map(non_blank))
}

fn coordinate(value: &Value) -> Option<(f64, f64)> {
    let pair = value.as_array()?;
    let x = pair.first()?.as_f64()?;
    let y = pair.get(1)?.as_f64()?;
    Some((x, y))
}

/// True if a coordinate pair cannot be geographic degrees.
pub fn looks_projected(x: f64, y: f64) -> bool {
    x.abs() > 180.0 || y.abs() > 90.0
}

/// Parse one point feature.
pub fn parse_point_feature(feature: &Value, object_id_field: Option<&str>) -> RawPointFeature {
    let empty = Map::new();
    let feature = feature.as_object().unwrap_or(&empty);
    let attributes = parse_attributes(feature);
    let object_id = extract_object_id(&attributes, object_id_field);

    let coordinate = feature.get("geometry").and_then(|g| {
        let x = g.get("x")?.as_f64()?;
        let y = g.get("y")?.as_f64()?;
        Some((x, y))
    });

    RawPointFeature {
        object_id,
        attributes,
        coordinate_is_projected: coordinate.is_some_and(|(x, y)| looks_projected(x, y)),
        coordinate,
    }
}

/// Parse one polyline or polygon feature.
///
/// Vertices that are not numeric pairs are dropped; whether the remaining
/// parts are long enough is decided later.
pub fn parse_line_feature(
    feature: &Value,
    object_id_field: Option<&str>,
    geometry_kind: GeometryKind,
) -> RawLineFeature {
    let empty = Map::new();
    let feature = feature.as_object().unwrap_or(&empty);
    let attributes = parse_attributes(feature);
    let object_id = extract_object_id(&attributes, object_id_field);

    let key = match geometry_kind {
        GeometryKind::Polyline => "paths",
        GeometryKind::Polygon => "rings",
    };

    let parts: Option<Vec<Vec<(f64, f64)>>> = feature
        .get("geometry")
        .and_then(|g| g.get(key))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(Value::as_array)
                .map(|part| part.iter().filter_map(coordinate).collect())
                .collect()
        });

    let coordinate_is_projected = parts.as_ref().is_some_and(|parts| {
        parts
            .iter()
            .flatten()
            .any(|&(x, y)| looks_projected(x, y))
    });

    RawLineFeature {
        object_id,
        attributes,
        parts,
        coordinate_is_projected,
        geometry_kind,
    }
}

/// Map an ArcGIS geometry type to a line geometry kind.
pub fn line_geometry_kind(esri_type: &str) -> Option<GeometryKind> {
    match esri_type {
        ESRI_POLYLINE => Some(GeometryKind::Polyline),
        ESRI_POLYGON => Some(GeometryKind::Polygon),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attributes_keep_nulls_and_stringify_scalars() {
        let feature = json!({
            "attributes": { "OBJECTID": 7, "name": "Barekamutyun", "note": null, "open": true }
        });
        let attrs = parse_attributes(feature.as_object().unwrap());

        assert_eq!(attrs["OBJECTID"].as_deref(), Some("7"));
        assert_eq!(attrs["name"].as_deref(), Some("Barekamutyun"));
        assert_eq!(attrs["note"], None);
        assert_eq!(attrs["open"].as_deref(), Some("true"));
    }

    #[test]
    fn object_id_prefers_declared_field() {
        let mut attrs = Attributes::new();
        attrs.insert("FID".into(), Some("3".into()));
        attrs.insert("objectid".into(), Some("9".into()));

        assert_eq!(extract_object_id(&attrs, Some("FID")).as_deref(), Some("3"));
        assert_eq!(extract_object_id(&attrs, None).as_deref(), Some("9"));
        assert_eq!(extract_object_id(&attrs, Some("missing")).as_deref(), Some("9"));
    }

    #[test]
    fn object_id_ignores_blank() {
        let mut attrs = Attributes::new();
        attrs.insert("OBJECTID".into(), Some("  ".into()));
        attrs.insert("id".into(), None);
        assert_eq!(extract_object_id(&attrs, Some("OBJECTID")), None);
    }

    #[test]
    fn point_geographic() {
        let feature = json!({
            "attributes": { "OBJECTID": 1 },
            "geometry": { "x": 44.5126, "y": 40.1777 }
        });
        let point = parse_point_feature(&feature, Some("OBJECTID"));

        assert_eq!(point.object_id.as_deref(), Some("1"));
        assert_eq!(point.coordinate, Some((44.5126, 40.1777)));
        assert!(!point.coordinate_is_projected);
    }

    #[test]
    fn point_projected() {
        let feature = json!({
            "attributes": { "OBJECTID": 1 },
            "geometry": { "x": 4955120.0, "y": 4891799.0 }
        });
        let point = parse_point_feature(&feature, None);
        assert!(point.coordinate_is_projected);
    }

    #[test]
    fn point_without_geometry() {
        let feature = json!({ "attributes": { "OBJECTID": 1 } });
        let point = parse_point_feature(&feature, None);
        assert!(point.coordinate.is_none());
    }

    #[test]
    fn polyline_paths() {
        let feature = json!({
            "attributes": { "OBJECTID": 4 },
            "geometry": { "paths": [
                [[44.50, 40.17], [44.51, 40.18], ["bad"]],
                [[44.52, 40.19]]
            ] }
        });
        let line = parse_line_feature(&feature, None, GeometryKind::Polyline);

        let parts = line.parts.unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], vec![(44.50, 40.17), (44.51, 40.18)]);
        assert_eq!(parts[1].len(), 1);
        assert!(!line.coordinate_is_projected);
    }

    #[test]
    fn polygon_reads_rings_not_paths() {
        let feature = json!({
            "attributes": { "OBJECTID": 4 },
            "geometry": { "paths": [[[1.0, 1.0], [2.0, 2.0]]] }
        });
        let line = parse_line_feature(&feature, None, GeometryKind::Polygon);
        assert!(line.parts.is_none());
    }

    #[test]
    fn geometry_kind_mapping() {
        assert_eq!(line_geometry_kind(ESRI_POLYLINE), Some(GeometryKind::Polyline));
        assert_eq!(line_geometry_kind(ESRI_POLYGON), Some(GeometryKind::Polygon));
        assert_eq!(line_geometry_kind(ESRI_POINT), None);
    }
}
