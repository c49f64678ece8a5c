//! Configuration for the network builder.

use crate::domain::TransitMode;

/// Configuration parameters for building the stop/line graph.
#[derive(Debug, Clone)]
pub struct NetworkBuilderConfig {
    /// Maximum stop-to-shape distance for metro, monorail and rail lines.
    pub fixed_guideway_threshold_meters: f64,

    /// Maximum stop-to-shape distance for road-based and unknown lines.
    pub road_threshold_meters: f64,

    /// Stop × line pair count above which membership derivation is split
    /// across threads.
    pub parallel_min_pairs: usize,

    /// Upper bound on worker threads for membership derivation.
    pub max_threads: usize,
}

impl NetworkBuilderConfig {
    /// Set both membership thresholds.
    pub fn with_thresholds(mut self, fixed_guideway: f64, road: f64) -> Self {
        self.fixed_guideway_threshold_meters = fixed_guideway;
        self.road_threshold_meters = road;
        self
    }

    /// Set the pair count above which derivation runs in parallel.
    pub fn with_parallel_min_pairs(mut self, n: usize) -> Self {
        self.parallel_min_pairs = n;
        self
    }

    /// Set the maximum number of worker threads.
    pub fn with_max_threads(mut self, n: usize) -> Self {
        self.max_threads = n.max(1);
        self
    }

    /// Membership threshold for lines of the given mode.
    pub fn threshold_for(&self, mode: TransitMode) -> f64 {
        if mode.is_fixed_guideway() {
            self.fixed_guideway_threshold_meters
        } else {
            self.road_threshold_meters
        }
    }
}

impl Default for NetworkBuilderConfig {
    fn default() -> Self {
        Self {
            fixed_guideway_threshold_meters: 220.0,
            road_threshold_meters: 300.0,
            parallel_min_pairs: 50_000,
            max_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}
