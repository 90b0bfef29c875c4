//! Trajectory generator
//!
//! Continues the unconsumed tail of the previous plan with points sampled
//! from a curve fitted through five anchors: two near anchors that fix the
//! current position and heading, and far anchors on the target lane centre.
//! Fitting happens in the reference pose's frame so the curve is a function
//! of local x even where the road doubles back in global coordinates.
//! Anchors that cannot be fitted fall back to following the lane in Frenet
//! coordinates.

use std::marker::PhantomData;

use log::{trace, warn};

use crate::common::{
    Interpolant, Path2D, PlannerError, PlannerResult, Point2D, Pose2D, TickInput, MPH_PER_MPS,
};
use crate::map::WaypointMap;
use super::cubic_spline::CubicSpline;

/// Tail points closer than this are treated as one position [m]
const MIN_POINT_SPACING: f64 = 1e-6;

/// Trajectory generator configuration
#[derive(Debug, Clone)]
pub struct TrajectoryConfig {
    /// Number of points in every emitted path
    pub horizon: usize,
    /// Time between consecutive points [s]
    pub tick: f64,
    /// Longitudinal spacing of the far anchors [m]
    pub anchor_spacing: f64,
    /// Number of far anchors
    pub anchor_count: usize,
    /// Local-frame lookahead used to set the sampling step [m]
    pub target_x: f64,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            horizon: 50,
            tick: 0.02,
            anchor_spacing: 30.0,
            anchor_count: 3,
            target_x: 30.0,
        }
    }
}

pub struct TrajectoryGenerator<S = CubicSpline> {
    config: TrajectoryConfig,
    _interpolant: PhantomData<S>,
}

impl TrajectoryGenerator<CubicSpline> {
    pub fn with_defaults() -> Self {
        Self::new(TrajectoryConfig::default())
    }
}

impl<S: Interpolant> TrajectoryGenerator<S> {
    pub fn new(config: TrajectoryConfig) -> Self {
        Self { config, _interpolant: PhantomData }
    }

    pub fn config(&self) -> &TrajectoryConfig {
        &self.config
    }

    /// Build the next path for `lane` at `reference_speed` [mph].
    ///
    /// The previous path is reused verbatim as the prefix. Degenerate anchors
    /// fall back to points along the road towards the lane centre.
    pub fn generate(
        &self,
        map: &WaypointMap,
        input: &TickInput,
        lane: usize,
        reference_speed: f64,
    ) -> PlannerResult<Path2D> {
        if !reference_speed.is_finite() {
            return Err(PlannerError::DegenerateGeometry(format!(
                "reference speed {} is not finite",
                reference_speed
            )));
        }
        let (reference, anchors) = self.anchors(map, input, lane)?;
        let local: Vec<Point2D> = anchors.iter().map(|p| reference.to_local(p)).collect();
        let xs: Vec<f64> = local.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = local.iter().map(|p| p.y).collect();

        let mut path = input.previous_path.clone();
        let remaining = self.config.horizon.saturating_sub(path.len());
        let speed = reference_speed / MPH_PER_MPS;

        match S::fit(&xs, &ys) {
            Ok(curve) => self.sample(&curve, &reference, speed, remaining, &mut path),
            Err(PlannerError::DegenerateGeometry(msg)) => {
                warn!("degenerate anchors ({}), following the lane instead", msg);
                self.follow_lane(map, &reference, lane, speed, remaining, &mut path)?;
            }
            Err(e) => return Err(e),
        }

        if !path.is_finite() {
            return Err(PlannerError::DegenerateGeometry(
                "generated path has non-finite points".to_string(),
            ));
        }
        Ok(path)
    }

    /// Reference pose and the anchor points in global coordinates
    pub fn anchors(
        &self,
        map: &WaypointMap,
        input: &TickInput,
        lane: usize,
    ) -> PlannerResult<(Pose2D, Vec<Point2D>)> {
        let previous = &input.previous_path.points;
        let (reference, mut anchors) = if previous.len() < 2 {
            let ego = &input.ego;
            let behind = Point2D::new(ego.x - ego.yaw.cos(), ego.y - ego.yaw.sin());
            (ego.pose(), vec![behind, ego.position()])
        } else {
            let last = previous[previous.len() - 1];
            let before = previous[previous.len() - 2];
            if before.distance(&last) > MIN_POINT_SPACING {
                (Pose2D::new(last.x, last.y, before.bearing_to(&last)), vec![before, last])
            } else {
                // Standing still at the end of the tail: take the heading from
                // the last distinct tail point, or from the road
                let yaw = match previous.iter().rev().find(|p| p.distance(&last) > MIN_POINT_SPACING) {
                    Some(p) => p.bearing_to(&last),
                    None => map.heading_at(map.wrap_s(input.effective_s()))?,
                };
                let behind = Point2D::new(last.x - yaw.cos(), last.y - yaw.sin());
                (Pose2D::new(last.x, last.y, yaw), vec![behind, last])
            }
        };

        let start_s = input.effective_s();
        let d = map.config().lane_center(lane);
        for k in 1..=self.config.anchor_count {
            let s = map.wrap_s(start_s + k as f64 * self.config.anchor_spacing);
            anchors.push(map.to_cartesian(s, d)?);
        }
        trace!("reference {:?}, anchors {:?}", reference, anchors);
        Ok((reference, anchors))
    }

    fn sample(&self, curve: &S, reference: &Pose2D, speed: f64, remaining: usize, path: &mut Path2D) {
        let target_x = self.config.target_x;
        let target_y = curve.eval(target_x);
        let target_dist = (target_x.powi(2) + target_y.powi(2)).sqrt();

        // target_x / N with N = target_dist / (tick * speed)
        let step = if speed > 0.0 && target_dist > 0.0 {
            target_x * self.config.tick * speed / target_dist
        } else {
            0.0
        };

        for i in 1..=remaining {
            let x = step * i as f64;
            path.push(reference.to_global(&Point2D::new(x, curve.eval(x))));
        }
    }

    /// Points along the road from the reference position, easing the lateral
    /// offset onto the lane centre over one anchor spacing
    fn follow_lane(
        &self,
        map: &WaypointMap,
        reference: &Pose2D,
        lane: usize,
        speed: f64,
        remaining: usize,
        path: &mut Path2D,
    ) -> PlannerResult<()> {
        let (start_s, start_d) = map.to_frenet(reference.x, reference.y, reference.yaw);
        let target_d = map.config().lane_center(lane);
        let step = self.config.tick * speed.max(0.0);
        for i in 1..=remaining {
            let ds = step * i as f64;
            let blend = (ds / self.config.anchor_spacing).min(1.0);
            let d = start_d + (target_d - start_d) * blend;
            path.push(map.to_cartesian(map.wrap_s(start_s + ds), d)?);
        }
        Ok(())
    }
}
