//! Common types used throughout highway_planner

use nalgebra::{Rotation2, Vector2};
use std::f64::consts::PI;

/// Conversion factor between the planner's speed unit (mph) and m/s
pub const MPH_PER_MPS: f64 = 2.24;

/// Normalize an angle to [-pi, pi]
pub fn normalize_angle(mut angle: f64) -> f64 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// 2D point representation, also used as a planned path point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

/// A point on the planned trajectory
pub type PathPoint = Point2D;

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Bearing from this point to `other`
    pub fn bearing_to(&self, other: &Point2D) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// 2D pose (position + orientation)
///
/// Also serves as the reference frame for local-frame trajectory fitting:
/// `to_local` puts the pose at the origin heading along +x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Express a global point in this pose's frame
    pub fn to_local(&self, p: &Point2D) -> Point2D {
        let shifted = p.to_vector() - self.position().to_vector();
        Point2D::from(Rotation2::new(-self.yaw) * shifted)
    }

    /// Express a point of this pose's frame in global coordinates
    pub fn to_global(&self, p: &Point2D) -> Point2D {
        Point2D::from(Rotation2::new(self.yaw) * p.to_vector() + self.position().to_vector())
    }
}

/// Path represented as a sequence of 2D points
#[derive(Debug, Clone, PartialEq)]
pub struct Path2D {
    pub points: Vec<Point2D>,
}

impl Path2D {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn from_xy(x: &[f64], y: &[f64]) -> Self {
        assert_eq!(x.len(), y.len());
        let points = x.iter().zip(y.iter())
            .map(|(&x, &y)| Point2D::new(x, y))
            .collect();
        Self { points }
    }

    pub fn push(&mut self, point: Point2D) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&Point2D> {
        self.points.last()
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.is_finite())
    }

    pub fn total_length(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.points.windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }
}

impl Default for Path2D {
    fn default() -> Self {
        Self::new()
    }
}

/// Ego vehicle state as reported by localization for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EgoState {
    pub x: f64,
    pub y: f64,
    pub s: f64,
    pub d: f64,
    /// Heading [rad]
    pub yaw: f64,
    /// Speed [mph]
    pub speed: f64,
}

impl EgoState {
    pub fn new(x: f64, y: f64, s: f64, d: f64, yaw: f64, speed: f64) -> Self {
        Self { x, y, s, d, yaw, speed }
    }

    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.yaw)
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Another vehicle reported by perception, valid for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedVehicle {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    /// Velocity [m/s]
    pub vx: f64,
    pub vy: f64,
    pub s: f64,
    pub d: f64,
}

impl TrackedVehicle {
    pub fn new(id: i64, x: f64, y: f64, vx: f64, vy: f64, s: f64, d: f64) -> Self {
        Self { id, x, y, vx, vy, s, d }
    }

    /// Speed magnitude [m/s]
    pub fn speed(&self) -> f64 {
        (self.vx.powi(2) + self.vy.powi(2)).sqrt()
    }
}

/// State carried from one planning tick to the next
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerState {
    pub current_lane: usize,
    /// Reference speed [mph]
    pub reference_speed: f64,
}

impl PlannerState {
    pub fn new(current_lane: usize, reference_speed: f64) -> Self {
        Self { current_lane, reference_speed }
    }
}

impl Default for PlannerState {
    fn default() -> Self {
        Self { current_lane: 1, reference_speed: 0.0 }
    }
}

/// Everything perception reports for one planning tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickInput {
    pub ego: EgoState,
    /// Unconsumed tail of the previous plan
    pub previous_path: Path2D,
    /// Frenet position at the end of `previous_path`
    pub end_path_s: f64,
    pub end_path_d: f64,
    pub vehicles: Vec<TrackedVehicle>,
}

impl TickInput {
    pub fn new(ego: EgoState, previous_path: Path2D, end_path_s: f64, end_path_d: f64, vehicles: Vec<TrackedVehicle>) -> Self {
        Self { ego, previous_path, end_path_s, end_path_d, vehicles }
    }

    /// Cold-start input with no queued path
    pub fn from_ego(ego: EgoState, vehicles: Vec<TrackedVehicle>) -> Self {
        Self::new(ego, Path2D::new(), ego.s, ego.d, vehicles)
    }

    /// Longitudinal position planning starts from: the end of the queued
    /// path if one is pending, otherwise the ego's own `s`
    pub fn effective_s(&self) -> f64 {
        if self.previous_path.is_empty() {
            self.ego.s
        } else {
            self.end_path_s
        }
    }
}
