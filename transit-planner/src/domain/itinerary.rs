//! Itinerary options returned by the route planner.
//!
//! An option is either a one-seat ride ([`DirectOption`]) or a ride with a
//! single change of line ([`TransferOption`]). Both can be ranked by their
//! estimated travel time.

use serde::{Deserialize, Serialize};

use super::{LineId, StopId, TransitMode};

/// Anything the planner can sort by estimated cost.
pub trait Rankable {
    /// Estimated door-to-door minutes, including expected waits.
    fn estimated_minutes(&self) -> f64;

    /// Estimated distance travelled, riding and walking.
    fn total_distance_meters(&self) -> f64;
}

/// Ride one line from the start stop to the end stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectOption {
    pub line_id: LineId,
    pub mode: TransitMode,
    pub estimated_distance_meters: f64,
    pub estimated_minutes: f64,
    /// Average minutes between vehicles on this line.
    pub headway_minutes: f64,
}

/// Ride one line to a transfer point, optionally walk, ride a second line.
///
/// When the two lines share a stop, `transfer_from_stop_id` and
/// `transfer_to_stop_id` are equal and `walking_distance_meters` is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferOption {
    pub first_line_id: LineId,
    pub second_line_id: LineId,
    pub transfer_from_stop_id: StopId,
    pub transfer_to_stop_id: StopId,
    pub walking_distance_meters: f64,
    pub total_distance_meters: f64,
    pub estimated_minutes: f64,
}

impl TransferOption {
    /// Key under which two transfer options describe the same itinerary.
    pub fn dedup_key(&self) -> (&LineId, &LineId, &StopId, &StopId) {
        (
            &self.first_line_id,
            &self.second_line_id,
            &self.transfer_from_stop_id,
            &self.transfer_to_stop_id,
        )
    }

    /// True if the change requires walking between two different stops.
    pub fn requires_walk(&self) -> bool {
        self.transfer_from_stop_id != self.transfer_to_stop_id
    }
}

/// A ranked answer to "how do I get from A to B".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItineraryOption {
    Direct(DirectOption),
    Transfer(TransferOption),
}

impl ItineraryOption {
    pub fn is_direct(&self) -> bool {
        matches!(self, ItineraryOption::Direct(_))
    }

    pub fn as_direct(&self) -> Option<&DirectOption> {
        match self {
            ItineraryOption::Direct(direct) => Some(direct),
            ItineraryOption::Transfer(_) => None,
        }
    }

    pub fn as_transfer(&self) -> Option<&TransferOption> {
        match self {
            ItineraryOption::Direct(_) => None,
            ItineraryOption::Transfer(transfer) => Some(transfer),
        }
    }

    /// Number of line changes.
    pub fn change_count(&self) -> usize {
        match self {
            ItineraryOption::Direct(_) => 0,
            ItineraryOption::Transfer(_) => 1,
        }
    }
}

impl Rankable for DirectOption {
    fn estimated_minutes(&self) -> f64 {
        self.estimated_minutes
    }

    fn total_distance_meters(&self) -> f64 {
        self.estimated_distance_meters
    }
}

impl Rankable for TransferOption {
    fn estimated_minutes(&self) -> f64 {
        self.estimated_minutes
    }

    fn total_distance_meters(&self) -> f64 {
        self.total_distance_meters
    }
}

impl Rankable for ItineraryOption {
    fn estimated_minutes(&self) -> f64 {
        match self {
            ItineraryOption::Direct(d) => d.estimated_minutes(),
            ItineraryOption::Transfer(t) => t.estimated_minutes(),
        }
    }

    fn total_distance_meters(&self) -> f64 {
        match self {
            ItineraryOption::Direct(d) => d.total_distance_meters(),
            ItineraryOption::Transfer(t) => t.total_distance_meters(),
        }
    }
}

impl From<DirectOption> for ItineraryOption {
    fn from(option: DirectOption) -> Self {
        ItineraryOption::Direct(option)
    }
}

impl From<TransferOption> for ItineraryOption {
    fn from(option: TransferOption) -> Self {
        ItineraryOption::Transfer(option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(from: &str, to: &str) -> TransferOption {
        TransferOption {
            first_line_id: LineId::parse("L1").unwrap(),
            second_line_id: LineId::parse("L2").unwrap(),
            transfer_from_stop_id: StopId::parse(from).unwrap(),
            transfer_to_stop_id: StopId::parse(to).unwrap(),
            walking_distance_meters: 0.0,
            total_distance_meters: 2500.0,
            estimated_minutes: 21.5,
        }
    }

    #[test]
    fn rankable_dispatch() {
        let direct = ItineraryOption::from(DirectOption {
            line_id: LineId::parse("L1").unwrap(),
            mode: TransitMode::Bus,
            estimated_distance_meters: 1300.0,
            estimated_minutes: 9.25,
            headway_minutes: 12.0,
        });
        assert_eq!(direct.estimated_minutes(), 9.25);
        assert_eq!(direct.total_distance_meters(), 1300.0);
        assert_eq!(direct.change_count(), 0);
        assert!(direct.is_direct());

        let option = ItineraryOption::from(transfer("S3", "S3"));
        assert_eq!(option.estimated_minutes(), 21.5);
        assert_eq!(option.total_distance_meters(), 2500.0);
        assert_eq!(option.change_count(), 1);
        assert!(option.as_direct().is_none());
    }

    #[test]
    fn walk_detection() {
        assert!(!transfer("S3", "S3").requires_walk());
        assert!(transfer("S3", "S9").requires_walk());
    }

    #[test]
    fn serialized_with_kind_tag() {
        let json = serde_json::to_value(ItineraryOption::from(transfer("S3", "S3"))).unwrap();
        assert_eq!(json["kind"], "transfer");
        assert_eq!(json["first_line_id"], "L1");
        assert_eq!(json["transfer_from_stop_id"], "S3");
    }
}
