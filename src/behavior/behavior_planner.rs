//! Behavior planner
//!
//! Picks the target lane and ramps the reference speed once per tick from the
//! current traffic picture. Nothing is latched across ticks except the
//! `PlannerState` handed in and returned.
//!
//! Priority when the current lane is blocked by a slower leader:
//! pass left, else pass right, else slow down. With a free lane the planner
//! speeds up and drifts one lane right when cruising near the limit.

use std::fmt;

use log::{debug, warn};

use crate::common::{PlannerState, TickInput, TrackedVehicle, MPH_PER_MPS};
use crate::map::WaypointMap;
use super::gap_checker::is_lane_change_safe;

/// Behavior planner configuration
#[derive(Debug, Clone)]
pub struct BehaviorConfig {
    /// Speed limit [mph]
    pub speed_limit: f64,
    /// Reference speed increase per tick [mph]
    pub accel_step: f64,
    /// Reference speed decrease per tick [mph]
    pub decel_step: f64,
    /// Leaders further ahead than this are ignored [m]
    pub follow_range: f64,
    /// Leader must be this much slower than the limit to count as an obstacle [mph]
    pub obstacle_margin: f64,
    /// Required gap for passing an obstacle [m]
    pub pass_gap: f64,
    /// Required gap for the keep-right move [m]
    pub keep_right_gap: f64,
    /// Keep-right only applies this close to the speed limit [mph]
    pub keep_right_margin: f64,
    /// Duration of one path point [s]
    pub tick: f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            speed_limit: 49.5,
            accel_step: 0.224,
            decel_step: 0.244,
            follow_range: 30.0,
            obstacle_margin: 3.0,
            pass_gap: 20.0,
            keep_right_gap: 50.0,
            keep_right_margin: 5.0,
            tick: 0.02,
        }
    }
}

/// Branch taken by the planner in one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorState {
    /// Free lane, at or ramping towards the limit
    Cruise,
    /// Slightly slower leader ahead, speed capped to it
    FollowConstrained,
    ChangingLeft,
    ChangingRight,
    /// Blocked with no safe lane, slowing down or holding speed
    Holding,
}

impl fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BehaviorState::Cruise => "CRUISE",
            BehaviorState::FollowConstrained => "FOLLOW_CONSTRAINED",
            BehaviorState::ChangingLeft => "CHANGING_LEFT",
            BehaviorState::ChangingRight => "CHANGING_RIGHT",
            BehaviorState::Holding => "HOLDING",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of one behavior tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorDecision {
    pub state: BehaviorState,
    /// Target lane for the trajectory
    pub lane: usize,
    /// Reference speed after this tick's ramp [mph]
    pub reference_speed: f64,
    /// Slowest leader speed in range, or the limit [mph]
    pub speed_constraint: f64,
    pub obstacle_detected: bool,
}

pub struct BehaviorPlanner {
    config: BehaviorConfig,
}

impl BehaviorPlanner {
    pub fn new(config: BehaviorConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(BehaviorConfig::default())
    }

    pub fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    /// Slowest speed [mph] among vehicles in `lane` that will be within
    /// `follow_range` ahead of `ego_s` once the ego has driven its queued
    /// path of `leftover` points. Starts from the speed limit.
    pub fn speed_constraint(
        &self,
        map: &WaypointMap,
        lane: usize,
        ego_s: f64,
        leftover: usize,
        vehicles: &[TrackedVehicle],
    ) -> f64 {
        let track = map.config();
        vehicles
            .iter()
            .filter(|v| track.in_lane(v.d, lane))
            .filter_map(|v| {
                let speed = v.speed();
                let predicted_s = v.s + leftover as f64 * self.config.tick * speed;
                let range = map.s_delta(ego_s, predicted_s);
                if range > 0.0 && range < self.config.follow_range {
                    Some(speed * MPH_PER_MPS)
                } else {
                    None
                }
            })
            .fold(self.config.speed_limit, f64::min)
    }

    /// Run one tick. The returned state carries the new lane and speed.
    pub fn plan(&self, map: &WaypointMap, state: PlannerState, input: &TickInput) -> (PlannerState, BehaviorDecision) {
        let cfg = &self.config;
        let lane_count = map.config().lane_count;
        let ego_s = input.effective_s();
        let ego_speed = input.ego.speed;
        let vehicles = &input.vehicles;

        let mut lane = state.current_lane;
        if lane >= lane_count {
            warn!("lane {} does not exist, using lane {}", lane, lane_count - 1);
            lane = lane_count - 1;
        }
        let mut speed = state.reference_speed;

        let speed_constraint = self.speed_constraint(map, lane, ego_s, input.previous_path.len(), vehicles);
        let obstacle_detected = cfg.speed_limit - speed_constraint > cfg.obstacle_margin;

        let lane_safe = |target: usize, gap: f64| is_lane_change_safe(map, ego_s, ego_speed, target, vehicles, gap);

        let behavior = if obstacle_detected {
            if lane > 0 && lane_safe(lane - 1, cfg.pass_gap) {
                lane -= 1;
                BehaviorState::ChangingLeft
            } else if lane + 1 < lane_count && lane_safe(lane + 1, cfg.pass_gap) {
                lane += 1;
                BehaviorState::ChangingRight
            } else {
                if speed >= speed_constraint {
                    speed = (speed - cfg.decel_step).max(0.0);
                }
                BehaviorState::Holding
            }
        } else {
            speed = self.accelerate(speed, speed_constraint);
            let close_to_limit = cfg.speed_limit - speed < cfg.keep_right_margin;
            if lane + 1 < lane_count && close_to_limit && lane_safe(lane + 1, cfg.keep_right_gap) {
                lane += 1;
                BehaviorState::ChangingRight
            } else if speed_constraint < cfg.speed_limit {
                BehaviorState::FollowConstrained
            } else {
                BehaviorState::Cruise
            }
        };

        debug!(
            "{}: lane {} -> {}, speed {:.3} -> {:.3} mph (constraint {:.1})",
            behavior, state.current_lane, lane, state.reference_speed, speed, speed_constraint
        );

        let decision = BehaviorDecision {
            state: behavior,
            lane,
            reference_speed: speed,
            speed_constraint,
            obstacle_detected,
        };
        (PlannerState::new(lane, speed), decision)
    }

    /// One acceleration step towards `target`, never past it
    fn accelerate(&self, speed: f64, target: f64) -> f64 {
        let next = speed + self.config.accel_step;
        if speed < target && next <= target {
            next
        } else {
            speed
        }
    }
}
