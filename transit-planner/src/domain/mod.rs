//! Domain types for the transit planner.
//!
//! This module contains the core model: stops, lines with their geometry,
//! the derived stop/line memberships and the itinerary options the planner
//! produces. Types enforce their invariants at construction time, so code
//! that receives them can trust their validity.

mod error;
mod geometry;
mod id;
mod itinerary;
mod line;
mod membership;
mod mode;
mod point;
mod stop;

pub use error::DomainError;
pub use geometry::{Geometry, GeometryKind};
pub use id::{InvalidId, LineId, StopId};
pub use itinerary::{DirectOption, ItineraryOption, Rankable, TransferOption};
pub use line::Line;
pub use membership::Membership;
pub use mode::{TransitMode, UnknownMode};
pub use point::Point;
pub use stop::Stop;
