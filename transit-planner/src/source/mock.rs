//! Mock feature source for development without portal access.
//!
//! Loads a fixed set of classified layers and their features from JSON files
//! and serves them as if they had been fetched from ArcGIS.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::error::SourceError;
use super::parse::{parse_line_feature, parse_point_feature};
use super::types::{LayerKind, RawLineFeature, RawPointFeature, SourceLayer};

/// Name of the layer index file inside the data directory.
pub const LAYER_INDEX_FILE: &str = "layers.json";

/// One entry of `layers.json`.
#[derive(Debug, Deserialize)]
struct MockLayerEntry {
    #[serde(flatten)]
    layer: SourceLayer,
    /// Feature file, relative to the data directory.
    file: String,
}

/// Mock feature source that serves data from JSON files.
///
/// Expects a `layers.json` listing every layer together with the file that
/// holds its features, e.g.
///
/// ```json
/// [{ "title": "Bus stops", "url": "https://host/services/Bus/MapServer/0",
///    "parent_title": null, "kind": { "kind": "stops" },
///    "object_id_field": "OBJECTID", "file": "bus_stops.json" }]
/// ```
///
/// Feature files use the ArcGIS `query` response format
/// (`{ "features": [...] }`).
#[derive(Debug, Clone)]
pub struct MockFeatureSource {
    source_id: String,
    layers: Arc<Vec<SourceLayer>>,
    /// Raw features keyed by layer URL.
    features: Arc<HashMap<String, Vec<Value>>>,
}

fn mock_error(message: String) -> SourceError {
    SourceError::Mock { message }
}

impl MockFeatureSource {
    /// Load all layers and features from a directory.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, SourceError> {
        let data_dir = data_dir.as_ref();
        let index_path = data_dir.join(LAYER_INDEX_FILE);

        let index = std::fs::read_to_string(&index_path)
            .map_err(|e| mock_error(format!("failed to read {index_path:?}: {e}")))?;
        let entries: Vec<MockLayerEntry> = serde_json::from_str(&index)
            .map_err(|e| mock_error(format!("failed to parse {index_path:?}: {e}")))?;

        if entries.is_empty() {
            return Err(SourceError::NoLayers);
        }

        let mut layers = Vec::with_capacity(entries.len());
        let mut features = HashMap::new();

        for entry in entries {
            let path = data_dir.join(&entry.file);
            let json = std::fs::read_to_string(&path)
                .map_err(|e| mock_error(format!("failed to read {path:?}: {e}")))?;
            let page: Value = serde_json::from_str(&json)
                .map_err(|e| mock_error(format!("failed to parse {path:?}: {e}")))?;

            let layer_features = page
                .get("features")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            features.insert(entry.layer.layer.url.clone(), layer_features);
            layers.push(entry.layer);
        }

        Ok(Self {
            source_id: format!("mock:{}", data_dir.display()),
            layers: Arc::new(layers),
            features: Arc::new(features),
        })
    }

    pub fn source_id(&self) -> String {
        self.source_id.clone()
    }

    pub async fn discover_layers(&self) -> Result<Vec<SourceLayer>, SourceError> {
        Ok(self.layers.as_ref().clone())
    }

    fn raw_features(&self, layer: &SourceLayer) -> Result<&[Value], SourceError> {
        self.features
            .get(&layer.layer.url)
            .map(Vec::as_slice)
            .ok_or_else(|| mock_error(format!("no mock data for layer {}", layer.layer.url)))
    }

    pub async fn fetch_point_features(
        &self,
        layer: &SourceLayer,
    ) -> Result<Vec<RawPointFeature>, SourceError> {
        let id_field = layer.object_id_field.as_deref();
        Ok(self
            .raw_features(layer)?
            .iter()
            .map(|f| parse_point_feature(f, id_field))
            .collect())
    }

    pub async fn fetch_line_features(
        &self,
        layer: &SourceLayer,
    ) -> Result<Vec<RawLineFeature>, SourceError> {
        let LayerKind::Lines { geometry_kind, .. } = layer.kind else {
            return Ok(Vec::new());
        };
        let id_field = layer.object_id_field.as_deref();
        Ok(self
            .raw_features(layer)?
            .iter()
            .map(|f| parse_line_feature(f, id_field, geometry_kind))
            .collect())
    }
}
