//! fleet-routes core
//!
//! Route registry, road-geometry fetching and the selection controller that
//! decides which route geometry gets drawn on a map.

pub mod traits;
pub mod error;
pub mod registry;
pub mod polyline;
pub mod projection;
pub mod surface;
pub mod ors;
pub mod config;
pub mod controller;
