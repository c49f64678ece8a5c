//! ArcGIS portal HTTP client.
//!
//! Discovers transit layers through an Experience Builder item and its web
//! maps, then pages through each layer's features with the REST `query`
//! endpoint.

use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::error::SourceError;
use super::layers::{LayerMetadata, classify, collect_layer_refs, extract_web_map_ids};
use super::parse::{parse_line_feature, parse_point_feature};
use super::types::{LayerKind, LayerRef, RawLineFeature, RawPointFeature, SourceLayer};

/// Default portal base URL.
const DEFAULT_PORTAL_URL: &str = "https://gis.yerevan.am/portal";

/// Default Experience Builder item holding the transport map.
const DEFAULT_EXPERIENCE_ID: &str = "13c109e913644a8d877db51465ace1f2";

/// Configuration for the ArcGIS client.
#[derive(Debug, Clone)]
pub struct ArcGisConfig {
    /// Portal base URL, without a trailing `/sharing`
    pub portal_url: String,
    /// Experience Builder item id
    pub experience_id: String,
    /// Features requested per page
    pub page_size: usize,
    /// Hard stop for a single layer
    pub max_records_per_layer: usize,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// How deep to descend into nested layer groups
    pub max_layer_depth: usize,
}

impl Default for ArcGisConfig {
    fn default() -> Self {
        Self {
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            experience_id: DEFAULT_EXPERIENCE_ID.to_string(),
            page_size: 2000,
            max_records_per_layer: 200_000,
            max_concurrent: 4,
            timeout_secs: 30,
            max_layer_depth: 16,
        }
    }
}

impl ArcGisConfig {
    /// Set the portal base URL.
    pub fn with_portal_url(mut self, url: impl Into<String>) -> Self {
        self.portal_url = url.into();
        self
    }

    /// Set the Experience Builder item id.
    pub fn with_experience_id(mut self, id: impl Into<String>) -> Self {
        self.experience_id = id.into();
        self
    }

    /// Set the page size for feature queries.
    pub fn with_page_size(mut self, n: usize) -> Self {
        self.page_size = n;
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// ArcGIS REST client.
///
/// Uses a semaphore to limit concurrent requests to the portal.
#[derive(Debug, Clone)]
pub struct ArcGisClient {
    http: reqwest::Client,
    config: ArcGisConfig,
    semaphore: Arc<Semaphore>,
}

impl ArcGisClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ArcGisConfig) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            config,
        })
    }

    /// Identifies the upstream data this client reads.
    pub fn source_id(&self) -> String {
        format!(
            "{}/items/{}",
            self.config.portal_url.trim_end_matches('/'),
            self.config.experience_id
        )
    }

    fn item_data_url(&self, item_id: &str) -> String {
        format!(
            "{}/sharing/rest/content/items/{}/data",
            self.config.portal_url.trim_end_matches('/'),
            item_id
        )
    }

    /// GET a JSON document, treating an ArcGIS `error` payload as a failure.
    async fn fetch_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, SourceError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| SourceError::LimiterClosed)?;

        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body).map_err(SourceError::json)?;

        if let Some(error) = json.get("error") {
            return Err(SourceError::Arcgis {
                url: url.to_string(),
                code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        Ok(json)
    }

    async fn fetch_item_data(&self, item_id: &str) -> Result<Value, SourceError> {
        self.fetch_json(&self.item_data_url(item_id), &[("f", "pjson".to_string())])
            .await
    }

    async fn fetch_metadata(&self, layer: &LayerRef) -> Result<LayerMetadata, SourceError> {
        let url = layer.url.trim_end_matches('/');
        let meta = self.fetch_json(url, &[("f", "pjson".to_string())]).await?;
        Ok(LayerMetadata::from_json(&meta))
    }

    /// Find and classify every stop and line layer.
    pub async fn discover_layers(&self) -> Result<Vec<SourceLayer>, SourceError> {
        let experience = self.fetch_item_data(&self.config.experience_id).await?;
        let web_map_ids = extract_web_map_ids(&experience);
        if web_map_ids.is_empty() {
            return Err(SourceError::NoLayers);
        }

        let web_maps = try_join_all(web_map_ids.iter().map(|id| self.fetch_item_data(id))).await?;

        let mut refs: Vec<LayerRef> = Vec::new();
        for web_map in &web_maps {
            let Some(operational) = web_map.get("operationalLayers") else {
                continue;
            };
            for layer in collect_layer_refs(operational, self.config.max_layer_depth) {
                if !refs.iter().any(|r| r.url == layer.url) {
                    refs.push(layer);
                }
            }
        }
        debug!(web_maps = web_maps.len(), layers = refs.len(), "layer tree walked");

        let metadata = try_join_all(refs.iter().map(|layer| self.fetch_metadata(layer))).await?;

        let layers: Vec<SourceLayer> = refs
            .iter()
            .zip(&metadata)
            .filter_map(|(layer, meta)| classify(layer, meta))
            .collect();

        if layers.is_empty() {
            return Err(SourceError::NoLayers);
        }

        info!(
            candidates = refs.len(),
            stop_layers = layers.iter().filter(|l| l.kind == LayerKind::Stops).count(),
            line_layers = layers.iter().filter(|l| l.kind != LayerKind::Stops).count(),
            "transit layers discovered"
        );
        Ok(layers)
    }

    /// Page through all features of a layer.
    ///
    /// Any failed page fails the whole layer.
    async fn query_all(&self, layer: &SourceLayer) -> Result<Vec<Value>, SourceError> {
        let url = format!("{}/query", layer.layer.url.trim_end_matches('/'));
        let page_size = self.config.page_size.max(1);
        let mut all = Vec::new();
        let mut offset = 0;
        let mut pages = 0;

        loop {
            let query = [
                ("where", "1=1".to_string()),
                ("outFields", "*".to_string()),
                ("returnGeometry", "true".to_string()),
                ("outSR", "4326".to_string()),
                ("f", "json".to_string()),
                ("resultOffset", offset.to_string()),
                ("resultRecordCount", page_size.to_string()),
            ];
            let page = self
                .fetch_json(&url, &query)
                .await
                .map_err(|e| SourceError::Page {
                    layer: layer.layer.title.clone(),
                    offset,
                    source: Box::new(e),
                })?;
            pages += 1;

            let features = match page.get("features").and_then(Value::as_array) {
                Some(features) if !features.is_empty() => features.clone(),
                _ => break,
            };
            let count = features.len();
            all.extend(features);

            let exceeded = page
                .get("exceededTransferLimit")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if !exceeded && count < page_size {
                break;
            }

            offset += count;
            if offset >= self.config.max_records_per_layer {
                warn!(
                    layer = %layer.layer.title,
                    offset,
                    "layer record cap reached, remaining features ignored"
                );
                break;
            }
        }

        debug!(layer = %layer.layer.title, features = all.len(), pages, "layer fetched");
        Ok(all)
    }

    /// Fetch every feature of a stop layer.
    pub async fn fetch_point_features(
        &self,
        layer: &SourceLayer,
    ) -> Result<Vec<RawPointFeature>, SourceError> {
        let features = self.query_all(layer).await?;
        let id_field = layer.object_id_field.as_deref();
        Ok(features
            .iter()
            .map(|f| parse_point_feature(f, id_field))
            .collect())
    }

    /// Fetch every feature of a line layer.
    pub async fn fetch_line_features(
        &self,
        layer: &SourceLayer,
    ) -> Result<Vec<RawLineFeature>, SourceError> {
        let LayerKind::Lines { geometry_kind, .. } = layer.kind else {
            return Ok(Vec::new());
        };
        let features = self.query_all(layer).await?;
        let id_field = layer.object_id_field.as_deref();
        Ok(features
            .iter()
            .map(|f| parse_line_feature(f, id_field, geometry_kind))
            .collect())
    }
}
