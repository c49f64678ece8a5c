//! Web layer for the transit planner.
//!
//! A thin JSON API over the [`TransportRepository`]: stop search, stop and
//! line lookups, route options, map data and sync control.
//!
//! [`TransportRepository`]: crate::repository::TransportRepository

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppRepository, AppState};
