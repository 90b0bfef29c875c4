//! Waypoint map of a closed-loop track
//!
//! Frenet coordinates: `s` is the arc length along the centreline polyline,
//! `d` is the lateral offset, positive to the right of the driving direction
//! (away from the loop interior).

use std::f64::consts::PI;

use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::common::{normalize_angle, PlannerError, PlannerResult, Point2D};

/// Track and lane layout configuration
#[derive(Debug, Clone)]
pub struct TrackConfig {
    /// Track length at which `s` wraps back to 0 [m]
    pub max_s: f64,
    /// Lane width [m]
    pub lane_width: f64,
    /// Number of lanes, lane 0 is next to the centreline
    pub lane_count: usize,
    /// Point inside the loop used to decide the sign of `d`
    pub interior_reference: Point2D,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            max_s: 6945.554,
            lane_width: 4.0,
            lane_count: 3,
            interior_reference: Point2D::new(1000.0, 2000.0),
        }
    }
}

impl TrackConfig {
    /// Lateral offset of a lane's centre
    pub fn lane_center(&self, lane: usize) -> f64 {
        self.lane_width * (lane as f64 + 0.5)
    }

    /// Lane band test: lane `L` covers `[w*L, w*(L+1))`
    pub fn in_lane(&self, d: f64, lane: usize) -> bool {
        let lower = self.lane_width * lane as f64;
        let upper = self.lane_width * (lane + 1) as f64;
        d >= lower && d < upper
    }

    /// Lane containing lateral offset `d`, if any
    pub fn lane_of(&self, d: f64) -> Option<usize> {
        (0..self.lane_count).find(|&lane| self.in_lane(d, lane))
    }
}

/// A sampled reference point on the track centreline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    /// Arc length along the centreline [m]
    pub s: f64,
    /// Unit normal pointing towards increasing `d`
    pub dx: f64,
    pub dy: f64,
}

impl Waypoint {
    pub fn new(x: f64, y: f64, s: f64, dx: f64, dy: f64) -> Self {
        Self { x, y, s, dx, dy }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    fn is_finite(&self) -> bool {
        [self.x, self.y, self.s, self.dx, self.dy].iter().all(|v| v.is_finite())
    }
}

/// Immutable map of track waypoints
#[derive(Debug, Clone)]
pub struct WaypointMap {
    waypoints: Vec<Waypoint>,
    /// Chord length from waypoint 0 to each waypoint
    cumulative: Vec<f64>,
    config: TrackConfig,
}

impl WaypointMap {
    pub fn new(waypoints: Vec<Waypoint>, config: TrackConfig) -> PlannerResult<Self> {
        if waypoints.len() < 2 {
            return Err(PlannerError::MapQueryOutOfRange(format!(
                "map needs at least 2 waypoints, got {}",
                waypoints.len()
            )));
        }
        if let Some(i) = waypoints.iter().position(|w| !w.is_finite()) {
            return Err(PlannerError::InvalidParameter(format!(
                "waypoint {} has non-finite values",
                i
            )));
        }
        if !(config.max_s.is_finite() && config.lane_width > 0.0 && config.lane_count > 0) {
            return Err(PlannerError::InvalidParameter(
                "track config needs finite max_s, positive lane width and lane count".to_string(),
            ));
        }
        for (i, (a, b)) in waypoints.iter().chain(waypoints.first()).tuple_windows().enumerate() {
            if a.position().distance(&b.position()) <= 0.0 {
                return Err(PlannerError::InvalidParameter(format!(
                    "waypoints {} and {} coincide",
                    i,
                    (i + 1) % waypoints.len()
                )));
            }
        }
        if waypoints.iter().tuple_windows().any(|(a, b)| b.s < a.s) {
            return Err(PlannerError::InvalidParameter(
                "waypoint s values must be non-decreasing".to_string(),
            ));
        }
        let last_s = waypoints[waypoints.len() - 1].s;
        if config.max_s <= last_s {
            return Err(PlannerError::InvalidParameter(format!(
                "max_s {} must exceed the last waypoint s {}",
                config.max_s, last_s
            )));
        }

        let cumulative = std::iter::once(0.0)
            .chain(
                waypoints
                    .iter()
                    .tuple_windows()
                    .map(|(a, b)| a.position().distance(&b.position()))
                    .scan(0.0, |acc, ds| {
                        *acc += ds;
                        Some(*acc)
                    }),
            )
            .collect();

        Ok(Self { waypoints, cumulative, config })
    }

    /// Regular polygon approximating a counter-clockwise circular loop.
    ///
    /// Positive `d` points away from `center`, which is also used as the
    /// interior reference point.
    pub fn circular(center: Point2D, radius: f64, count: usize) -> PlannerResult<Self> {
        if count < 3 || !(radius > 0.0) {
            return Err(PlannerError::InvalidParameter(
                "circular track needs at least 3 waypoints and a positive radius".to_string(),
            ));
        }
        let chord = 2.0 * radius * (PI / count as f64).sin();
        let waypoints = (0..count)
            .map(|i| {
                let theta = 2.0 * PI * i as f64 / count as f64;
                let (sin, cos) = theta.sin_cos();
                Waypoint::new(
                    center.x + radius * cos,
                    center.y + radius * sin,
                    chord * i as f64,
                    cos,
                    sin,
                )
            })
            .collect();
        let config = TrackConfig {
            max_s: chord * count as f64,
            interior_reference: center,
            ..TrackConfig::default()
        };
        Self::new(waypoints, config)
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false for a constructed map, kept alongside `len`
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    pub fn max_s(&self) -> f64 {
        self.config.max_s
    }

    /// Wrap `s` into `[0, max_s)`
    pub fn wrap_s(&self, s: f64) -> f64 {
        let wrapped = s.rem_euclid(self.config.max_s);
        // rem_euclid may round up to max_s for tiny negative inputs
        if wrapped >= self.config.max_s {
            0.0
        } else {
            wrapped
        }
    }

    /// Signed longitudinal distance from `from` to `to`, taking the shorter
    /// way around the loop
    pub fn s_delta(&self, from: f64, to: f64) -> f64 {
        let max_s = self.config.max_s;
        let diff = (to - from).rem_euclid(max_s);
        if diff > max_s / 2.0 {
            diff - max_s
        } else {
            diff
        }
    }

    /// Index of the waypoint nearest to `(x, y)`; ties go to the lowest index
    pub fn closest_waypoint(&self, x: f64, y: f64) -> usize {
        let p = Point2D::new(x, y);
        self.waypoints
            .iter()
            .enumerate()
            .min_by_key(|(_, w)| OrderedFloat(w.position().distance(&p)))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Index of the first waypoint ahead of a vehicle at `(x, y)` heading
    /// `heading`. May return `len()` when the closest waypoint is the last one
    /// and lies behind.
    pub fn next_waypoint(&self, x: f64, y: f64, heading: f64) -> usize {
        let closest = self.closest_waypoint(x, y);
        let bearing = Point2D::new(x, y).bearing_to(&self.waypoints[closest].position());
        let angle = normalize_angle(heading - bearing).abs();
        if angle > PI / 4.0 {
            closest + 1
        } else {
            closest
        }
    }

    /// Cartesian to Frenet conversion, returns `(s, d)`
    pub fn to_frenet(&self, x: f64, y: f64, heading: f64) -> (f64, f64) {
        let n = self.waypoints.len();
        let next = self.next_waypoint(x, y, heading) % n;
        let prev = if next == 0 { n - 1 } else { next - 1 };

        let origin = self.waypoints[prev].position().to_vector();
        let segment = self.waypoints[next].position().to_vector() - origin;
        let relative = Point2D::new(x, y).to_vector() - origin;

        let projection = segment * (relative.dot(&segment) / segment.norm_squared());
        let mut d = (relative - projection).norm();

        let center = self.config.interior_reference.to_vector() - origin;
        if (center - relative).norm() <= (center - projection).norm() {
            d = -d;
        }

        // signed: a point before `prev` gets a negative offset
        let along = relative.dot(&segment) / segment.norm();
        (self.wrap_s(self.cumulative[prev] + along), d)
    }

    /// Direction of travel [rad] of the centreline segment containing `s`
    pub fn heading_at(&self, s: f64) -> PlannerResult<f64> {
        let here = self.to_cartesian(s, 0.0)?;
        let ahead = self.to_cartesian(self.wrap_s(s + 1.0), 0.0)?;
        Ok(here.bearing_to(&ahead))
    }

    /// Frenet to Cartesian conversion.
    ///
    /// `s` must already be wrapped into `[0, max_s)`, see `wrap_s`.
    pub fn to_cartesian(&self, s: f64, d: f64) -> PlannerResult<Point2D> {
        if !(s.is_finite() && d.is_finite()) {
            return Err(PlannerError::MapQueryOutOfRange(format!(
                "non-finite frenet coordinates ({}, {})",
                s, d
            )));
        }
        if s < 0.0 || s >= self.config.max_s {
            return Err(PlannerError::MapQueryOutOfRange(format!(
                "s = {} outside [0, {}), wrap before converting",
                s, self.config.max_s
            )));
        }

        let prev = self
            .waypoints
            .iter()
            .take_while(|w| w.s <= s)
            .count()
            .saturating_sub(1);
        let wp2 = (prev + 1) % self.waypoints.len();

        let start = self.waypoints[prev].position();
        let heading = start.bearing_to(&self.waypoints[wp2].position());
        let seg_s = s - self.waypoints[prev].s;
        let perp_heading = heading - PI / 2.0;

        Ok(Point2D::new(
            start.x + seg_s * heading.cos() + d * perp_heading.cos(),
            start.y + seg_s * heading.sin() + d * perp_heading.sin(),
        ))
    }
}
