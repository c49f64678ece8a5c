//! Layer discovery and classification.
//!
//! An Experience Builder item points at one or more web maps; each web map
//! has a tree of operational layers. We flatten that tree, then decide from
//! titles and layer metadata which layers hold stops and which hold lines.

use std::collections::HashSet;

use serde_json::Value;
use tracing::trace;

use crate::domain::TransitMode;

use super::parse::{ESRI_POINT, line_geometry_kind};
use super::types::{LayerKind, LayerRef, SourceLayer};

/// Title used for layers that have a URL but no title.
const UNTITLED_LAYER: &str = "Layer";

const STOP_KEYWORDS: [&str; 6] = ["կայարան", "մետրո", "միառելս", "station", "stop", "transport"];

/// Armenian for "station", matched against field names.
const STATION_FIELD_KEYWORD: &str = "կայան";

const LINE_KEYWORDS: [&str; 11] = [
    "մետրո",
    "միառելս",
    "երկաթ",
    "գիծ",
    "ավտոբուս",
    "տրոլեյբուս",
    "երթուղ",
    "line",
    "rail",
    "route",
    "bus",
];

const LINE_EXCLUDE_KEYWORDS: [&str; 5] = [
    "սահման",
    "administrative",
    "մայթեր",
    "փողոցներ",
    "ճանապարհներ",
];

/// What a layer's `?f=pjson` metadata tells us.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerMetadata {
    pub geometry_type: Option<String>,
    pub object_id_field: Option<String>,
    pub field_names: Vec<String>,
}

impl LayerMetadata {
    pub fn from_json(meta: &Value) -> Self {
        let text = |key: &str| meta.get(key).and_then(Value::as_str).map(str::to_string);
        let field_names = meta
            .get("fields")
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|f| f.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            geometry_type: text("geometryType"),
            object_id_field: text("objectIdField"),
            field_names,
        }
    }
}

/// Web map item ids referenced by an Experience Builder item's data sources.
///
/// Order follows the data source map; duplicates are dropped.
pub fn extract_web_map_ids(experience: &Value) -> Vec<String> {
    let mut seen = HashSet::new();
    experience
        .get("dataSources")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|sources| sources.values())
        .filter_map(|source| source.get("itemId").and_then(Value::as_str))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect()
}

/// Flatten a web map's `operationalLayers` tree into layer references.
///
/// Walks depth-first in document order with an explicit stack, descending
/// into nested `layers` arrays no deeper than `max_depth`. Each layer with a
/// URL is recorded with the title of its nearest titled ancestor. A URL seen
/// twice is kept once.
pub fn collect_layer_refs(operational_layers: &Value, max_depth: usize) -> Vec<LayerRef> {
    let mut refs = Vec::new();
    let mut seen_urls = HashSet::new();

    // (layer json, parent title, depth)
    let mut stack: Vec<(&Value, Option<String>, usize)> = Vec::new();
    push_children(&mut stack, operational_layers, None, 0);

    while let Some((layer, parent_title, depth)) = stack.pop() {
        let title = layer
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        let url = layer
            .get("url")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();

        if !url.is_empty() && seen_urls.insert(url.to_string()) {
            refs.push(LayerRef {
                title: if title.is_empty() {
                    UNTITLED_LAYER.to_string()
                } else {
                    title.to_string()
                },
                url: url.to_string(),
                parent_title: parent_title.clone(),
            });
        }

        if depth < max_depth {
            let next_parent = if title.is_empty() {
                parent_title
            } else {
                Some(title.to_string())
            };
            if let Some(children) = layer.get("layers") {
                push_children(&mut stack, children, next_parent, depth + 1);
            }
        } else {
            trace!(title, depth, "layer tree depth cap reached");
        }
    }

    refs
}

fn push_children<'a>(
    stack: &mut Vec<(&'a Value, Option<String>, usize)>,
    children: &'a Value,
    parent_title: Option<String>,
    depth: usize,
) {
    if let Some(children) = children.as_array() {
        // Reversed so that popping visits them in document order.
        for child in children.iter().rev() {
            stack.push((child, parent_title.clone(), depth));
        }
    }
}

/// Decide what, if anything, a layer contributes.
pub fn classify(layer: &LayerRef, meta: &LayerMetadata) -> Option<SourceLayer> {
    let geometry_type = meta.geometry_type.as_deref()?;
    let text = layer.search_text();

    let kind = if geometry_type == ESRI_POINT {
        let by_title = STOP_KEYWORDS.iter().any(|k| text.contains(k));
        let by_field = meta
            .field_names
            .iter()
            .any(|f| f.to_lowercase().contains(STATION_FIELD_KEYWORD));
        (by_title || by_field).then_some(LayerKind::Stops)?
    } else {
        let geometry_kind = line_geometry_kind(geometry_type)?;
        let included = LINE_KEYWORDS.iter().any(|k| text.contains(k));
        let excluded = LINE_EXCLUDE_KEYWORDS.iter().any(|k| text.contains(k));
        (included && !excluded).then_some(LayerKind::Lines {
            mode: infer_mode(&text),
            geometry_kind,
        })?
    };

    Some(SourceLayer {
        layer: layer.clone(),
        kind,
        object_id_field: meta.object_id_field.clone(),
    })
}

/// Infer the transit mode from lower-cased layer text.
///
/// More specific names are checked first: "trolleybus" and "minibus" both
/// contain "bus".
pub fn infer_mode(text: &str) -> TransitMode {
    let has = |keys: &[&str]| keys.iter().any(|k| text.contains(k));

    if has(&["մետրո", "metro"]) {
        TransitMode::Metro
    } else if has(&["միառելս", "monorail"]) {
        TransitMode::Monorail
    } else if has(&["երկաթ", "railway"]) {
        TransitMode::Rail
    } else if has(&["տրոլեյբուս", "trolleybus"]) {
        TransitMode::Trolleybus
    } else if has(&["միկրոավտոբուս", "երթուղային", "minibus"]) {
        TransitMode::Minibus
    } else if has(&["ավտոբուս", "bus"]) {
        TransitMode::Bus
    } else {
        TransitMode::Transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GeometryKind;
    use serde_json::json;

    fn layer(title: &str, parent: Option<&str>) -> LayerRef {
        LayerRef {
            title: title.into(),
            url: format!("https://host/services/{title}/MapServer/0"),
            parent_title: parent.map(str::to_string),
        }
    }

    fn meta(geometry_type: &str, fields: &[&str]) -> LayerMetadata {
        LayerMetadata {
            geometry_type: Some(geometry_type.into()),
            object_id_field: Some("OBJECTID".into()),
            field_names: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn web_map_ids_deduplicated() {
        let experience = json!({
            "dataSources": {
                "ds1": { "itemId": "abc" },
                "ds2": { "itemId": "def" },
                "ds3": { "itemId": "abc" },
                "ds4": { "itemId": "  " },
                "ds5": { "type": "no item" }
            }
        });
        assert_eq!(extract_web_map_ids(&experience), vec!["abc", "def"]);
        assert!(extract_web_map_ids(&json!({})).is_empty());
    }

    #[test]
    fn layer_tree_flattened_in_order_with_parent_titles() {
        let tree = json!([
            { "title": "Մետրո", "layers": [
                { "title": "Stations", "url": "https://h/1" },
                { "title": "", "url": "https://h/2" },
                { "title": "", "layers": [
                    { "title": "Deep", "url": "https://h/3" }
                ] }
            ] },
            { "title": "Roads", "url": "https://h/4" },
            { "title": "Dup", "url": "https://h/1" }
        ]);

        let refs = collect_layer_refs(&tree, 8);
        let urls: Vec<_> = refs.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://h/1", "https://h/2", "https://h/3", "https://h/4"]);

        assert_eq!(refs[0].parent_title.as_deref(), Some("Մետրո"));
        assert_eq!(refs[1].title, "Layer");
        // Untitled groups pass their parent's title through.
        assert_eq!(refs[2].parent_title.as_deref(), Some("Մետրո"));
        assert_eq!(refs[3].parent_title, None);
    }

    #[test]
    fn layer_tree_depth_cap() {
        let tree = json!([
            { "title": "A", "url": "https://h/a", "layers": [
                { "title": "B", "url": "https://h/b", "layers": [
                    { "title": "C", "url": "https://h/c" }
                ] }
            ] }
        ]);
        assert_eq!(collect_layer_refs(&tree, 1).len(), 2);
        assert_eq!(collect_layer_refs(&tree, 0).len(), 1);
    }

    #[test]
    fn metadata_from_json() {
        let m = LayerMetadata::from_json(&json!({
            "geometryType": "esriGeometryPoint",
            "objectIdField": "FID",
            "fields": [{ "name": "FID" }, { "name": "մետրո_կայան" }, { "alias": "x" }]
        }));
        assert_eq!(m.geometry_type.as_deref(), Some("esriGeometryPoint"));
        assert_eq!(m.object_id_field.as_deref(), Some("FID"));
        assert_eq!(m.field_names, vec!["FID", "մետրո_կայան"]);
    }

    #[test]
    fn stop_layers() {
        let classified = classify(&layer("Bus stops", None), &meta(ESRI_POINT, &[])).unwrap();
        assert_eq!(classified.kind, LayerKind::Stops);
        assert_eq!(classified.object_id_field.as_deref(), Some("OBJECTID"));

        // Matched by a station field even with an unhelpful title.
        assert!(classify(&layer("Points", None), &meta(ESRI_POINT, &["ԿԱՅԱՆ_ID"])).is_some());
        assert!(classify(&layer("Schools", None), &meta(ESRI_POINT, &["name"])).is_none());
    }

    #[test]
    fn line_layers() {
        let classified = classify(
            &layer("Line 1", Some("Մետրո")),
            &meta("esriGeometryPolyline", &[]),
        )
        .unwrap();
        assert_eq!(
            classified.kind,
            LayerKind::Lines {
                mode: TransitMode::Metro,
                geometry_kind: GeometryKind::Polyline,
            }
        );

        let excluded = classify(
            &layer("administrative line", None),
            &meta("esriGeometryPolygon", &[]),
        );
        assert!(excluded.is_none());

        assert!(classify(&layer("Parks", None), &meta("esriGeometryPolygon", &[])).is_none());
    }

    #[test]
    fn layers_without_geometry_type_ignored() {
        let m = LayerMetadata::default();
        assert!(classify(&layer("Bus stops", None), &m).is_none());
    }

    #[test]
    fn unknown_geometry_type_ignored() {
        assert!(classify(&layer("Bus route", None), &meta("esriGeometryMultipoint", &[])).is_none());
    }

    #[test]
    fn mode_inference() {
        assert_eq!(infer_mode("մետրո line"), TransitMode::Metro);
        assert_eq!(infer_mode("միառելս"), TransitMode::Monorail);
        assert_eq!(infer_mode("երկաթուղի"), TransitMode::Rail);
        assert_eq!(infer_mode("trolleybus route 2"), TransitMode::Trolleybus);
        assert_eq!(infer_mode("երթուղային 23"), TransitMode::Minibus);
        assert_eq!(infer_mode("ավտոբուս 1"), TransitMode::Bus);
        assert_eq!(infer_mode("route"), TransitMode::Transport);
    }
}
