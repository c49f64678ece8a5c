//! Feature sources: where raw stop and line geometry comes from.
//!
//! The production source is an ArcGIS portal ([`ArcGisClient`]); a
//! [`MockFeatureSource`] serves the same shapes from JSON fixtures. Both
//! hand back loosely-typed raw features that the network builder cleans up.

mod client;
mod error;
mod layers;
mod mock;
mod parse;
mod types;

use std::future::Future;

use futures::future::try_join_all;
use tracing::{debug, info};

pub use client::{ArcGisClient, ArcGisConfig};
pub use error::SourceError;
pub use mock::MockFeatureSource;
pub use parse::looks_projected;
pub use types::{
    Attributes, LayerBatch, LayerFeatures, LayerKind, LayerRef, RawLineFeature, RawPointFeature,
    SourceLayer,
};

/// Trait for providing raw transit features.
///
/// This abstraction allows the repository to be tested with fixture data.
pub trait FeatureSource: Send + Sync {
    /// Identifies the upstream data set, recorded with each sync.
    fn source_id(&self) -> String;

    /// Find every stop and line layer.
    fn discover_layers(
        &self,
    ) -> impl Future<Output = Result<Vec<SourceLayer>, SourceError>> + Send;

    /// Fetch all features of a stop layer, following pagination.
    fn fetch_point_features(
        &self,
        layer: &SourceLayer,
    ) -> impl Future<Output = Result<Vec<RawPointFeature>, SourceError>> + Send;

    /// Fetch all features of a line layer, following pagination.
    fn fetch_line_features(
        &self,
        layer: &SourceLayer,
    ) -> impl Future<Output = Result<Vec<RawLineFeature>, SourceError>> + Send;
}

impl FeatureSource for ArcGisClient {
    fn source_id(&self) -> String {
        ArcGisClient::source_id(self)
    }

    async fn discover_layers(&self) -> Result<Vec<SourceLayer>, SourceError> {
        ArcGisClient::discover_layers(self).await
    }

    async fn fetch_point_features(
        &self,
        layer: &SourceLayer,
    ) -> Result<Vec<RawPointFeature>, SourceError> {
        ArcGisClient::fetch_point_features(self, layer).await
    }

    async fn fetch_line_features(
        &self,
        layer: &SourceLayer,
    ) -> Result<Vec<RawLineFeature>, SourceError> {
        ArcGisClient::fetch_line_features(self, layer).await
    }
}

impl FeatureSource for MockFeatureSource {
    fn source_id(&self) -> String {
        MockFeatureSource::source_id(self)
    }

    async fn discover_layers(&self) -> Result<Vec<SourceLayer>, SourceError> {
        MockFeatureSource::discover_layers(self).await
    }

    async fn fetch_point_features(
        &self,
        layer: &SourceLayer,
    ) -> Result<Vec<RawPointFeature>, SourceError> {
        MockFeatureSource::fetch_point_features(self, layer).await
    }

    async fn fetch_line_features(
        &self,
        layer: &SourceLayer,
    ) -> Result<Vec<RawLineFeature>, SourceError> {
        MockFeatureSource::fetch_line_features(self, layer).await
    }
}

/// The feature source selected at startup.
#[derive(Debug, Clone)]
pub enum ConfiguredSource {
    ArcGis(ArcGisClient),
    Mock(MockFeatureSource),
}

impl FeatureSource for ConfiguredSource {
    fn source_id(&self) -> String {
        match self {
            ConfiguredSource::ArcGis(c) => c.source_id(),
            ConfiguredSource::Mock(m) => m.source_id(),
        }
    }

    async fn discover_layers(&self) -> Result<Vec<SourceLayer>, SourceError> {
        match self {
            ConfiguredSource::ArcGis(c) => c.discover_layers().await,
            ConfiguredSource::Mock(m) => m.discover_layers().await,
        }
    }

    async fn fetch_point_features(
        &self,
        layer: &SourceLayer,
    ) -> Result<Vec<RawPointFeature>, SourceError> {
        match self {
            ConfiguredSource::ArcGis(c) => c.fetch_point_features(layer).await,
            ConfiguredSource::Mock(m) => m.fetch_point_features(layer).await,
        }
    }

    async fn fetch_line_features(
        &self,
        layer: &SourceLayer,
    ) -> Result<Vec<RawLineFeature>, SourceError> {
        match self {
            ConfiguredSource::ArcGis(c) => c.fetch_line_features(layer).await,
            ConfiguredSource::Mock(m) => m.fetch_line_features(layer).await,
        }
    }
}

/// Fetch the features of one classified layer.
pub async fn fetch_layer<S: FeatureSource>(
    source: &S,
    layer: SourceLayer,
) -> Result<LayerBatch, SourceError> {
    let features = match layer.kind {
        LayerKind::Stops => LayerFeatures::Points(source.fetch_point_features(&layer).await?),
        LayerKind::Lines { .. } => LayerFeatures::Lines(source.fetch_line_features(&layer).await?),
    };
    debug!(
        layer = %layer.layer.title,
        features = features.len(),
        "layer features fetched"
    );
    Ok(LayerBatch { layer, features })
}

/// Discover all layers and fetch all of their features.
///
/// Layers are fetched concurrently; the first failure fails the whole fetch
/// so callers never see a partial network.
pub async fn fetch_network<S: FeatureSource>(source: &S) -> Result<Vec<LayerBatch>, SourceError> {
    let layers = source.discover_layers().await?;
    let batches = try_join_all(layers.into_iter().map(|layer| fetch_layer(source, layer))).await?;

    info!(
        layers = batches.len(),
        features = batches.iter().map(|b| b.features.len()).sum::<usize>(),
        "feature source fetched"
    );
    Ok(batches)
}
