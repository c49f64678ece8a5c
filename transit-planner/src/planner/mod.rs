//! Route planner over a stop/line network.
//!
//! Answers "how do I get from stop A to stop B" with ranked estimates:
//! direct rides first, and when there are none, options with exactly one
//! change of line, either at a shared stop or by walking between the
//! nearest pair of stops.
//!
//! Travel times are estimates from straight-line distance, a per-mode
//! detour factor, cruising speed and half the headway as expected wait.
//! There are no timetables.

mod config;
mod index;
mod profile;
mod rank;
mod search;


pub use config::PlannerConfig;
pub use index::NetworkIndex;
pub use profile::{ModeProfile, meters_per_minute};
pub use rank::{deduplicate_transfers, rank_options};
pub use search::{PlanError, RoutePlanner};
