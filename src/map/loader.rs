//! Waypoint file loading
//!
//! One waypoint per line: `x y s dx dy`, separated by whitespace or commas.

use std::fs;
use std::path::Path;

use log::info;

use crate::common::{PlannerError, PlannerResult};
use super::waypoint_map::{TrackConfig, Waypoint, WaypointMap};

/// Parse waypoint records from text
pub fn parse_waypoints(text: &str) -> PlannerResult<Vec<Waypoint>> {
    let mut waypoints = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let values = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(|t| t.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|e| PlannerError::ParseError(format!("line {}: {}", lineno + 1, e)))?;
        if values.len() != 5 {
            return Err(PlannerError::ParseError(format!(
                "line {}: expected 5 values (x y s dx dy), found {}",
                lineno + 1,
                values.len()
            )));
        }
        waypoints.push(Waypoint::new(values[0], values[1], values[2], values[3], values[4]));
    }
    Ok(waypoints)
}

impl WaypointMap {
    /// Load a map file. Any failure here means no planning is possible.
    pub fn load<P: AsRef<Path>>(path: P, config: TrackConfig) -> PlannerResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let waypoints = parse_waypoints(&text)?;
        info!("loaded {} waypoints from {}", waypoints.len(), path.as_ref().display());
        Self::new(waypoints, config)
    }
}
