//! Per-mode travel estimates.
//!
//! There is no timetable input: every estimate is a fixed function of
//! straight-line distance and three per-mode constants.

use serde::{Deserialize, Serialize};

use crate::domain::{Point, TransitMode};
use crate::geomath::distance_meters;

const ROAD: ModeProfile = ModeProfile::new(24.0, 12.0, 1.30);

/// Travel characteristics of one transit mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeProfile {
    /// Average speed including dwell time at stops.
    pub speed_kmh: f64,
    /// Average minutes between vehicles.
    pub headway_minutes: f64,
    /// Route length over straight-line distance.
    pub detour_multiplier: f64,
}

impl ModeProfile {
    pub const fn new(speed_kmh: f64, headway_minutes: f64, detour_multiplier: f64) -> Self {
        Self {
            speed_kmh,
            headway_minutes,
            detour_multiplier,
        }
    }

    /// Built-in profile for a mode.
    ///
    /// These are rough city-wide estimates, not measured values; override
    /// them per mode with [`PlannerConfig::with_profile`]. Fixed-guideway
    /// modes have lower detour multipliers than road-based ones. All
    /// road-based modes share one profile.
    ///
    /// [`PlannerConfig::with_profile`]: super::PlannerConfig::with_profile
    pub const fn default_for(mode: TransitMode) -> Self {
        match mode {
            TransitMode::Metro => Self::new(32.0, 8.0, 1.18),
            TransitMode::Monorail => Self::new(26.0, 10.0, 1.22),
            TransitMode::Rail => Self::new(40.0, 18.0, 1.16),
            TransitMode::Bus
            | TransitMode::Trolleybus
            | TransitMode::Minibus
            | TransitMode::Transport => ROAD,
        }
    }

    /// Estimated ride distance between two points.
    pub fn ride_distance_meters(&self, from: Point, to: Point) -> f64 {
        distance_meters(from, to) * self.detour_multiplier
    }

    /// Minutes on board for a ride of the given length.
    pub fn ride_minutes(&self, distance_meters: f64) -> f64 {
        distance_meters / meters_per_minute(self.speed_kmh)
    }

    /// Expected wait for a vehicle: half the headway.
    pub fn expected_wait_minutes(&self) -> f64 {
        self.headway_minutes / 2.0
    }
}

/// Convert a speed to meters per minute.
pub fn meters_per_minute(speed_kmh: f64) -> f64 {
    speed_kmh * 1000.0 / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_profiles() {
        let metro = ModeProfile::default_for(TransitMode::Metro);
        assert_eq!(metro, ModeProfile::new(32.0, 8.0, 1.18));
        assert_eq!(metro.expected_wait_minutes(), 4.0);

        let other = ModeProfile::default_for(TransitMode::Transport);
        assert_eq!(other.detour_multiplier, 1.30);
        for mode in [TransitMode::Bus, TransitMode::Trolleybus, TransitMode::Minibus] {
            assert_eq!(ModeProfile::default_for(mode), other);
        }
    }

    #[test]
    fn road_modes_detour_more_than_rail() {
        for mode in TransitMode::ALL {
            let profile = ModeProfile::default_for(mode);
            if mode.is_fixed_guideway() {
                assert!(profile.detour_multiplier < 1.25, "{mode}");
            } else {
                assert_eq!(profile.detour_multiplier, 1.30, "{mode}");
            }
        }
    }

    #[test]
    fn ride_estimates() {
        let profile = ModeProfile::new(24.0, 12.0, 1.5);
        // 24 km/h = 400 m/min
        assert!((profile.ride_minutes(2000.0) - 5.0).abs() < 1e-9);

        let a = Point::new(40.18, 44.51);
        let b = Point::new(40.19, 44.51);
        let straight = distance_meters(a, b);
        assert!((profile.ride_distance_meters(a, b) - 1.5 * straight).abs() < 1e-9);
    }

    #[test]
    fn walking_speed() {
        assert!((meters_per_minute(4.8) - 80.0).abs() < 1e-9);
    }
}
