//! Trajectory generation
//!
//! - `cubic_spline`: natural cubic spline interpolant
//! - `trajectory_generator`: fixed-horizon path continuing the previous plan

pub mod cubic_spline;
pub mod trajectory_generator;

pub use cubic_spline::CubicSpline;
pub use trajectory_generator::{TrajectoryConfig, TrajectoryGenerator};
