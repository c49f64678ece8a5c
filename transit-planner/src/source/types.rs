//! Raw feature records as delivered by a feature source.
//!
//! These types are deliberately loose: identity and geometry may be missing
//! and coordinates may still be in a projected system. The network builder
//! is responsible for validating and normalizing them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{GeometryKind, TransitMode};

/// Free-form feature attributes. `None` preserves explicit JSON nulls.
pub type Attributes = BTreeMap<String, Option<String>>;

/// A reference to a layer found while walking a web map's layer tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRef {
    pub title: String,
    pub url: String,
    /// Title of the nearest titled ancestor group, if any.
    pub parent_title: Option<String>,
}

impl LayerRef {
    /// Lower-cased "parent title + title", used for keyword classification.
    pub fn search_text(&self) -> String {
        format!(
            "{} {}",
            self.parent_title.as_deref().unwrap_or_default(),
            self.title
        )
        .to_lowercase()
    }
}

/// What a layer contributes to the transit network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerKind {
    Stops,
    Lines {
        mode: TransitMode,
        geometry_kind: GeometryKind,
    },
}

/// A classified layer, ready to be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLayer {
    #[serde(flatten)]
    pub layer: LayerRef,
    pub kind: LayerKind,
    /// Attribute holding the object id, as declared by the layer metadata.
    #[serde(default)]
    pub object_id_field: Option<String>,
}

/// A raw point feature (a candidate stop).
#[derive(Debug, Clone, PartialEq)]
pub struct RawPointFeature {
    pub object_id: Option<String>,
    pub attributes: Attributes,
    /// `(x, y)`, i.e. `(lng, lat)` when geographic.
    pub coordinate: Option<(f64, f64)>,
    pub coordinate_is_projected: bool,
}

/// A raw line feature (a candidate line).
#[derive(Debug, Clone, PartialEq)]
pub struct RawLineFeature {
    pub object_id: Option<String>,
    pub attributes: Attributes,
    /// Parts of `(x, y)` vertices; `None` when the feature had no geometry.
    pub parts: Option<Vec<Vec<(f64, f64)>>>,
    pub coordinate_is_projected: bool,
    pub geometry_kind: GeometryKind,
}

/// Features fetched from one layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerFeatures {
    Points(Vec<RawPointFeature>),
    Lines(Vec<RawLineFeature>),
}

impl LayerFeatures {
    pub fn len(&self) -> usize {
        match self {
            LayerFeatures::Points(features) => features.len(),
            LayerFeatures::Lines(features) => features.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One fetched layer together with its features.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerBatch {
    pub layer: SourceLayer,
    pub features: LayerFeatures,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_text_includes_parent() {
        let layer = LayerRef {
            title: "Stations".into(),
            url: "https://host/0".into(),
            parent_title: Some("Մետրո".into()),
        };
        assert_eq!(layer.search_text(), "մետրո stations");

        let orphan = LayerRef {
            parent_title: None,
            ..layer
        };
        assert_eq!(orphan.search_text(), " stations");
    }

    #[test]
    fn source_layer_json_shape() {
        let layer: SourceLayer = serde_json::from_str(
            r#"{
                "title": "Metro line",
                "url": "https://host/services/Metro/MapServer/1",
                "parent_title": null,
                "kind": { "kind": "lines", "mode": "METRO", "geometry_kind": "polyline" }
            }"#,
        )
        .unwrap();

        assert_eq!(
            layer.kind,
            LayerKind::Lines {
                mode: TransitMode::Metro,
                geometry_kind: GeometryKind::Polyline,
            }
        );
        assert!(layer.object_id_field.is_none());
    }
}
