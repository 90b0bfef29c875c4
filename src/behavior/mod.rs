//! Behavior layer: lane safety checks and the per-tick lane/speed decision

pub mod gap_checker;
pub mod behavior_planner;

pub use gap_checker::{is_lane_change_safe, time_to_collision};
pub use behavior_planner::{BehaviorConfig, BehaviorDecision, BehaviorPlanner, BehaviorState};
