//! City transit trip planner.
//!
//! Builds a stop/line network from ArcGIS feature layers, derives which
//! lines serve which stops from their geometry, and answers "how do I get
//! from this stop to that one" with ranked direct and one-transfer options.

pub mod config;
pub mod domain;
pub mod geomath;
pub mod network;
pub mod planner;
pub mod repository;
pub mod source;
pub mod store;
pub mod web;
