//! Turns raw feature batches into a clean stop/line/membership graph.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{Geometry, Line, LineId, Membership, Stop, StopId, TransitMode};
use crate::source::{LayerBatch, LayerFeatures, LayerKind, RawLineFeature, RawPointFeature, SourceLayer};

use super::config::NetworkBuilderConfig;
use super::membership::derive_memberships;
use super::naming::{line_name, stop_name};
use super::normalize::{normalize_coordinate, normalize_parts};

/// Why a single raw feature was left out of the network.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, thiserror::Error,
)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The feature has no usable object id
    #[error("feature has no object id")]
    MissingId,

    /// The feature has no geometry, or it could not be read
    #[error("feature has missing or unreadable geometry")]
    MissingGeometry,

    /// A line whose parts all have fewer than 2 points
    #[error("line has no part with at least 2 points")]
    DegenerateGeometry,
}

/// Diagnostics for one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub stops: usize,
    pub lines: usize,
    pub memberships: usize,
    /// Stop features collapsed into an earlier stop with the same id.
    pub duplicate_stops: usize,
    /// Line features collapsed into an earlier line with the same id.
    pub duplicate_lines: usize,
    /// Line parts dropped for having fewer than 2 points.
    pub dropped_parts: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl BuildReport {
    fn skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_default() += 1;
    }

    /// Total number of skipped features.
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// The output of a build.
///
/// Stops and lines are sorted by `(name, id)`; memberships by
/// `(line id, projected distance, stop id)`.
#[derive(Debug, Clone, Default)]
pub struct BuiltNetwork {
    pub stops: Vec<Stop>,
    pub lines: Vec<Line>,
    pub memberships: Vec<Membership>,
    pub report: BuildReport,
}

/// Builds the transit graph from raw features.
///
/// A malformed feature is counted and skipped; it never fails the build.
#[derive(Debug, Clone, Default)]
pub struct NetworkBuilder {
    config: NetworkBuilderConfig,
}

impl NetworkBuilder {
    pub fn new(config: NetworkBuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NetworkBuilderConfig {
        &self.config
    }

    /// Build a stop from a raw point feature.
    pub fn build_stop(layer: &SourceLayer, feature: &RawPointFeature) -> Result<Stop, SkipReason> {
        let object_id = feature.object_id.as_deref().ok_or(SkipReason::MissingId)?;
        let coordinate = feature
            .coordinate
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .ok_or(SkipReason::MissingGeometry)?;

        let location = normalize_coordinate(coordinate, feature.coordinate_is_projected);
        if !location.is_valid() {
            return Err(SkipReason::MissingGeometry);
        }

        Ok(Stop::new(
            StopId::from_source(&layer.layer.url, object_id),
            stop_name(&feature.attributes, &layer.layer.title, object_id),
            location,
        ))
    }

    /// Build a line from a raw line feature.
    ///
    /// Returns the line and the number of parts dropped from its geometry.
    pub fn build_line(
        layer: &SourceLayer,
        mode: TransitMode,
        feature: &RawLineFeature,
    ) -> Result<(Line, usize), SkipReason> {
        let object_id = feature.object_id.as_deref().ok_or(SkipReason::MissingId)?;
        let parts = feature.parts.as_ref().ok_or(SkipReason::MissingGeometry)?;

        let parts = normalize_parts(parts, feature.coordinate_is_projected);
        let (shape, dropped) = Geometry::from_parts(feature.geometry_kind, parts)
            .map_err(|_| SkipReason::DegenerateGeometry)?;

        let line = Line::new(
            LineId::from_source(&layer.layer.url, object_id),
            line_name(&feature.attributes, &layer.layer.title, object_id),
            mode,
            shape,
        );
        Ok((line, dropped))
    }

    /// Build the whole network from fetched layers.
    ///
    /// Features with the same id are collapsed, the last one winning.
    /// Memberships are derived from scratch for the deduplicated set.
    pub fn build(&self, batches: &[LayerBatch]) -> BuiltNetwork {
        let mut report = BuildReport::default();
        let mut stops: BTreeMap<StopId, Stop> = BTreeMap::new();
        let mut lines: BTreeMap<LineId, Line> = BTreeMap::new();

        for batch in batches {
            let layer = &batch.layer;
            match &batch.features {
                LayerFeatures::Points(features) => {
                    for feature in features {
                        match Self::build_stop(layer, feature) {
                            Ok(stop) => {
                                if stops.insert(stop.id.clone(), stop).is_some() {
                                    report.duplicate_stops += 1;
                                }
                            }
                            Err(reason) => report.skip(reason),
                        }
                    }
                }
                LayerFeatures::Lines(features) => {
                    let mode = match layer.kind {
                        LayerKind::Lines { mode, .. } => mode,
                        LayerKind::Stops => {
                            warn!(layer = %layer.layer.title, "line features in a stop layer");
                            TransitMode::Transport
                        }
                    };
                    for feature in features {
                        match Self::build_line(layer, mode, feature) {
                            Ok((line, dropped)) => {
                                report.dropped_parts += dropped;
                                if lines.insert(line.id.clone(), line).is_some() {
                                    report.duplicate_lines += 1;
                                }
                            }
                            Err(reason) => report.skip(reason),
                        }
                    }
                }
            }
            debug!(
                layer = %layer.layer.title,
                features = batch.features.len(),
                "layer mapped"
            );
        }

        let mut stops: Vec<Stop> = stops.into_values().collect();
        stops.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let mut lines: Vec<Line> = lines.into_values().collect();
        lines.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let memberships = derive_memberships(&stops, &lines, &self.config);

        report.stops = stops.len();
        report.lines = lines.len();
        report.memberships = memberships.len();

        info!(
            stops = report.stops,
            lines = report.lines,
            memberships = report.memberships,
            duplicate_stops = report.duplicate_stops,
            duplicate_lines = report.duplicate_lines,
            dropped_parts = report.dropped_parts,
            skipped = report.skipped_total(),
            "network built"
        );

        BuiltNetwork {
            stops,
            lines,
            memberships,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GeometryKind;
    use crate::source::{Attributes, LayerRef};

    const STOP_LAYER_URL: &str = "https://gis.example.am/server/rest/services/Transport/Stops/MapServer/0";
    const LINE_LAYER_URL: &str = "https://gis.example.am/server/rest/services/Transport/Bus/MapServer/1";

    fn stop_layer() -> SourceLayer {
        SourceLayer {
            layer: LayerRef {
                title: "Stops".into(),
                url: STOP_LAYER_URL.into(),
                parent_title: None,
            },
            kind: LayerKind::Stops,
            object_id_field: Some("OBJECTID".into()),
        }
    }

    fn line_layer() -> SourceLayer {
        SourceLayer {
            layer: LayerRef {
                title: "Bus routes".into(),
                url: LINE_LAYER_URL.into(),
                parent_title: None,
            },
            kind: LayerKind::Lines {
                mode: TransitMode::Bus,
                geometry_kind: GeometryKind::Polyline,
            },
            object_id_field: Some("OBJECTID".into()),
        }
    }

    fn named(name: &str) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("name".into(), Some(name.into()));
        attrs
    }

    fn point(id: Option<&str>, name: &str, coordinate: Option<(f64, f64)>) -> RawPointFeature {
        RawPointFeature {
            object_id: id.map(str::to_string),
            attributes: named(name),
            coordinate,
            coordinate_is_projected: false,
        }
    }

    fn polyline(id: Option<&str>, name: &str, parts: Option<Vec<Vec<(f64, f64)>>>) -> RawLineFeature {
        RawLineFeature {
            object_id: id.map(str::to_string),
            attributes: named(name),
            parts,
            coordinate_is_projected: false,
            geometry_kind: GeometryKind::Polyline,
        }
    }

    /// Three stops along an east-west street and one route down it.
    fn sample_batches() -> Vec<LayerBatch> {
        vec![
            LayerBatch {
                layer: stop_layer(),
                features: LayerFeatures::Points(vec![
                    point(Some("1"), "Opera", Some((44.5140, 40.1860))),
                    point(Some("2"), "Mashtots", Some((44.5080, 40.1861))),
                    point(Some("3"), "Far away", Some((44.6000, 40.3000))),
                ]),
            },
            LayerBatch {
                layer: line_layer(),
                features: LayerFeatures::Lines(vec![polyline(
                    Some("7"),
                    "Route 7",
                    Some(vec![vec![(44.5000, 40.1860), (44.5200, 40.1860)]]),
                )]),
            },
        ]
    }

    #[test]
    fn stop_identity_and_name() {
        let stop = NetworkBuilder::build_stop(
            &stop_layer(),
            &point(Some("42"), "Opera", Some((44.514, 40.186))),
        )
        .unwrap();

        assert_eq!(stop.id.as_str(), "Transport_Stops_MapServer_0:42");
        assert_eq!(stop.name, "Opera");
        assert_eq!(stop.location.lat, 40.186);
        assert_eq!(stop.location.lng, 44.514);
    }

    #[test]
    fn stop_name_falls_back_to_layer() {
        let mut feature = point(Some("42"), "", Some((44.514, 40.186)));
        feature.attributes.clear();
        let stop = NetworkBuilder::build_stop(&stop_layer(), &feature).unwrap();
        assert_eq!(stop.name, "Stops #42");
    }

    #[test]
    fn malformed_stops_skipped() {
        let layer = stop_layer();
        assert_eq!(
            NetworkBuilder::build_stop(&layer, &point(None, "x", Some((44.5, 40.1)))),
            Err(SkipReason::MissingId)
        );
        assert_eq!(
            NetworkBuilder::build_stop(&layer, &point(Some("1"), "x", None)),
            Err(SkipReason::MissingGeometry)
        );
        assert_eq!(
            NetworkBuilder::build_stop(&layer, &point(Some("1"), "x", Some((f64::NAN, 40.1)))),
            Err(SkipReason::MissingGeometry)
        );
    }

    #[test]
    fn degenerate_lines_skipped() {
        let layer = line_layer();
        let result = NetworkBuilder::build_line(
            &layer,
            TransitMode::Bus,
            &polyline(Some("1"), "x", Some(vec![vec![(44.5, 40.1)], vec![]])),
        );
        assert_eq!(result.unwrap_err(), SkipReason::DegenerateGeometry);

        let result =
            NetworkBuilder::build_line(&layer, TransitMode::Bus, &polyline(Some("1"), "x", None));
        assert_eq!(result.unwrap_err(), SkipReason::MissingGeometry);
    }

    #[test]
    fn short_parts_dropped_from_line() {
        let (line, dropped) = NetworkBuilder::build_line(
            &line_layer(),
            TransitMode::Bus,
            &polyline(
                Some("1"),
                "x",
                Some(vec![vec![(44.5, 40.1)], vec![(44.5, 40.1), (44.6, 40.1)]]),
            ),
        )
        .unwrap();
        assert_eq!(dropped, 1);
        assert_eq!(line.shape.parts().len(), 1);
        assert_eq!(line.mode, TransitMode::Bus);
    }

    #[test]
    fn build_derives_memberships() {
        let network = NetworkBuilder::default().build(&sample_batches());

        assert_eq!(network.stops.len(), 3);
        assert_eq!(network.lines.len(), 1);

        // Sorted by name.
        let names: Vec<_> = network.stops.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Far away", "Mashtots", "Opera"]);

        // Mashtots lies west of Opera, so it comes first along the route.
        let on_route: Vec<_> = network
            .memberships
            .iter()
            .map(|m| m.stop_id.as_str())
            .collect();
        assert_eq!(
            on_route,
            vec!["Transport_Stops_MapServer_0:2", "Transport_Stops_MapServer_0:1"]
        );
        assert_eq!(network.report.memberships, 2);
        assert_eq!(network.report.skipped_total(), 0);
    }

    #[test]
    fn duplicates_collapse_last_writer_wins() {
        let mut batches = sample_batches();
        batches.push(LayerBatch {
            layer: stop_layer(),
            features: LayerFeatures::Points(vec![point(
                Some("1"),
                "Opera (renamed)",
                Some((44.5140, 40.1860)),
            )]),
        });

        let network = NetworkBuilder::default().build(&batches);
        assert_eq!(network.stops.len(), 3);
        assert_eq!(network.report.duplicate_stops, 1);
        assert!(network.stops.iter().any(|s| s.name == "Opera (renamed)"));
        assert!(!network.stops.iter().any(|s| s.name == "Opera"));
    }

    #[test]
    fn skipped_features_counted_not_fatal() {
        let mut batches = sample_batches();
        batches.push(LayerBatch {
            layer: stop_layer(),
            features: LayerFeatures::Points(vec![
                point(None, "no id", Some((44.5, 40.1))),
                point(Some("9"), "no geometry", None),
            ]),
        });
        batches.push(LayerBatch {
            layer: line_layer(),
            features: LayerFeatures::Lines(vec![polyline(Some("8"), "stub", Some(vec![vec![]]))]),
        });

        let network = NetworkBuilder::default().build(&batches);
        assert_eq!(network.stops.len(), 3);
        assert_eq!(network.lines.len(), 1);
        assert_eq!(network.report.skipped[&SkipReason::MissingId], 1);
        assert_eq!(network.report.skipped[&SkipReason::MissingGeometry], 1);
        assert_eq!(network.report.skipped[&SkipReason::DegenerateGeometry], 1);
        assert_eq!(network.report.skipped_total(), 3);
    }

    #[test]
    fn rebuild_is_idempotent_and_order_independent() {
        let builder = NetworkBuilder::default();
        let first = builder.build(&sample_batches());
        let again = builder.build(&sample_batches());

        let mut reversed = sample_batches();
        reversed.reverse();
        for batch in &mut reversed {
            if let LayerFeatures::Points(points) = &mut batch.features {
                points.reverse();
            }
        }
        let shuffled = builder.build(&reversed);

        assert_eq!(first.memberships, again.memberships);
        assert_eq!(first.memberships, shuffled.memberships);
        assert_eq!(first.stops, shuffled.stops);
        assert_eq!(first.lines, shuffled.lines);
    }

    #[test]
    fn report_serializes_skip_reasons_as_keys() {
        let mut report = BuildReport::default();
        report.skip(SkipReason::MissingId);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["skipped"]["missing_id"], 1);
    }
}
