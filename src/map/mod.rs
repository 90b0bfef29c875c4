//! Track map and Frenet frame
//!
//! - `waypoint_map`: ordered centreline waypoints, nearest/next lookups and
//!   Frenet <-> Cartesian conversion
//! - `loader`: reading waypoint files

pub mod waypoint_map;
pub mod loader;

pub use waypoint_map::{TrackConfig, Waypoint, WaypointMap};
pub use loader::parse_waypoints;
