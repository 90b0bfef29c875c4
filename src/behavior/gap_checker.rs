//! Longitudinal gap check for a candidate lane

use log::{debug, trace};

use crate::common::{TrackedVehicle, MPH_PER_MPS};
use crate::map::WaypointMap;

const MIN_CLOSING_SPEED: f64 = 1e-6; // [m/s]

/// Time until two vehicles `range` metres apart meet, given their closing
/// speed [m/s]. `None` when they are not closing in any meaningful way.
pub fn time_to_collision(range: f64, closing_speed: f64) -> Option<f64> {
    if !range.is_finite() || !closing_speed.is_finite() || closing_speed.abs() < MIN_CLOSING_SPEED {
        return None;
    }
    Some(range / closing_speed)
}

/// Whether `target_lane` is free of vehicles within `min_gap` metres of the
/// ego, ahead or behind.
///
/// Only the distance gap decides. Time to collision is logged at trace
/// level and never gates the result. A vehicle whose lane or range cannot be
/// determined makes the lane unsafe.
pub fn is_lane_change_safe(
    map: &WaypointMap,
    ego_s: f64,
    ego_speed: f64,
    target_lane: usize,
    vehicles: &[TrackedVehicle],
    min_gap: f64,
) -> bool {
    let track = map.config();
    for vehicle in vehicles {
        if !vehicle.d.is_finite() {
            debug!("vehicle {} has unknown lateral position, lane {} treated as unsafe", vehicle.id, target_lane);
            return false;
        }
        if !track.in_lane(vehicle.d, target_lane) {
            continue;
        }

        let range = map.s_delta(vehicle.s, ego_s);
        if !range.is_finite() {
            debug!("vehicle {} has unknown range, lane {} treated as unsafe", vehicle.id, target_lane);
            return false;
        }

        let closing_speed = vehicle.speed() - ego_speed / MPH_PER_MPS;
        if let Some(ttc) = time_to_collision(range, closing_speed) {
            trace!("vehicle {} in lane {}: range {:.1} m, ttc {:.1} s", vehicle.id, target_lane, range, ttc);
        }

        if range.abs() < min_gap {
            debug!(
                "lane {} blocked by vehicle {} at range {:.1} m (gap {:.0} m)",
                target_lane, vehicle.id, range, min_gap
            );
            return false;
        }
    }
    true
}
