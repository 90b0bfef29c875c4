//! Highway behavior and trajectory planner
//!
//! Plans a smooth, drivable path for a car on a closed-loop multi-lane
//! highway, once per control tick:
//!
//! - `map` converts between Cartesian and Frenet (s, d) coordinates
//! - `behavior` picks a lane and reference speed from sensed traffic
//! - `trajectory` turns that choice into a fixed-horizon point sequence
//! - `planner` ties the three together with a per-tick fallback
//! - `telemetry` decodes simulator frames and encodes control replies

// Core modules
pub mod common;
pub mod map;
pub mod utils;

// Planning modules
pub mod behavior;
pub mod trajectory;
pub mod planner;
pub mod telemetry;

// Re-export common types for convenience
pub use common::{EgoState, Path2D, PathPoint, PlannerState, Point2D, Pose2D, TickInput, TrackedVehicle};
pub use common::{Interpolant, MPH_PER_MPS};
pub use common::{PlannerError, PlannerResult};
pub use map::{TrackConfig, Waypoint, WaypointMap};
pub use behavior::{BehaviorConfig, BehaviorDecision, BehaviorPlanner, BehaviorState};
pub use trajectory::{CubicSpline, TrajectoryConfig, TrajectoryGenerator};
pub use planner::{HighwayPlanner, PlannerConfig, TickOutcome};
pub use telemetry::{Event, PlannerSession};
