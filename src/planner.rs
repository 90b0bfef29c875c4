//! Highway planner: one behavior decision plus one trajectory per tick
//!
//! The planner itself holds only immutable data. `PlannerState` goes in and
//! comes back out of every call, so ticks never share hidden state.

use std::sync::Arc;

use log::warn;

use crate::behavior::{BehaviorConfig, BehaviorDecision, BehaviorPlanner};
use crate::common::{Interpolant, Path2D, PlannerState, TickInput};
use crate::map::WaypointMap;
use crate::trajectory::{CubicSpline, TrajectoryConfig, TrajectoryGenerator};

/// Planner configuration
#[derive(Debug, Clone, Default)]
pub struct PlannerConfig {
    pub behavior: BehaviorConfig,
    pub trajectory: TrajectoryConfig,
}

/// Result of one planning tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// State to pass into the next tick
    pub state: PlannerState,
    /// Path to hand to the vehicle controller
    pub path: Path2D,
    /// `None` when the tick fell back to the previous path
    pub decision: Option<BehaviorDecision>,
}

pub struct HighwayPlanner<S = CubicSpline> {
    map: Arc<WaypointMap>,
    behavior: BehaviorPlanner,
    trajectory: TrajectoryGenerator<S>,
}

impl HighwayPlanner<CubicSpline> {
    pub fn with_defaults(map: Arc<WaypointMap>) -> Self {
        Self::new(map, PlannerConfig::default())
    }
}

impl<S: Interpolant> HighwayPlanner<S> {
    pub fn new(map: Arc<WaypointMap>, config: PlannerConfig) -> Self {
        Self {
            map,
            behavior: BehaviorPlanner::new(config.behavior),
            trajectory: TrajectoryGenerator::new(config.trajectory),
        }
    }

    pub fn map(&self) -> &WaypointMap {
        &self.map
    }

    /// Plan one tick.
    ///
    /// Never fails: if the trajectory cannot be built the previous path tail
    /// is returned unchanged together with the incoming state.
    pub fn plan(&self, state: PlannerState, input: &TickInput) -> TickOutcome {
        let (next_state, decision) = self.behavior.plan(&self.map, state, input);
        match self
            .trajectory
            .generate(&self.map, input, next_state.current_lane, next_state.reference_speed)
        {
            Ok(path) => TickOutcome { state: next_state, path, decision: Some(decision) },
            Err(e) => {
                warn!("planning failed ({}), keeping previous path, lane and speed", e);
                TickOutcome { state, path: input.previous_path.clone(), decision: None }
            }
        }
    }
}
