//! Configuration for the route planner.

use std::collections::BTreeMap;

use crate::domain::TransitMode;

use super::profile::ModeProfile;

/// Configuration parameters for route search.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Maximum number of shared stops tried per line pair.
    pub transfer_sample_limit: usize,

    /// Maximum walk between two stops for a walking transfer (meters).
    /// Line pairs whose nearest stops are further apart are not offered.
    pub max_walk_meters: f64,

    /// Maximum number of options to return.
    pub max_results: usize,

    /// Fixed cost of changing lines (minutes).
    pub transfer_penalty_minutes: f64,

    /// Walking speed for walking transfers (km/h).
    pub walking_speed_kmh: f64,

    /// Per-mode overrides; modes not listed use [`ModeProfile::default_for`].
    pub profiles: BTreeMap<TransitMode, ModeProfile>,
}

impl PlannerConfig {
    /// Create a new configuration with the given parameters and built-in
    /// mode profiles.
    pub fn new(
        transfer_sample_limit: usize,
        max_walk_meters: f64,
        max_results: usize,
        transfer_penalty_minutes: f64,
        walking_speed_kmh: f64,
    ) -> Self {
        Self {
            transfer_sample_limit,
            max_walk_meters,
            max_results,
            transfer_penalty_minutes,
            walking_speed_kmh,
            profiles: BTreeMap::new(),
        }
    }

    /// Override the profile of one mode.
    pub fn with_profile(mut self, mode: TransitMode, profile: ModeProfile) -> Self {
        self.profiles.insert(mode, profile);
        self
    }

    /// Profile used for lines of the given mode.
    pub fn profile(&self, mode: TransitMode) -> ModeProfile {
        self.profiles
            .get(&mode)
            .copied()
            .unwrap_or_else(|| ModeProfile::default_for(mode))
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self::new(8, 1200.0, 16, 4.0, 4.8)
    }
}
