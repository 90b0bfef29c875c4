//! Telemetry message codec and tick session
//!
//! Frames follow the simulator's event protocol: `42` followed by a JSON
//! array `[event_name, payload]`. Shape checks happen here so the planning
//! core only ever sees fully populated `TickInput`s.

use log::{debug, warn};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::{EgoState, Path2D, PlannerError, PlannerResult, PlannerState, TickInput, TrackedVehicle};
use crate::planner::HighwayPlanner;

const EVENT_PREFIX: &str = "42";
const SENSOR_FIELDS: usize = 7;

/// Decoded inbound event
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Telemetry(TickInput),
    Other(String),
}

#[derive(Debug, Deserialize)]
struct TelemetryMessage {
    x: f64,
    y: f64,
    s: f64,
    d: f64,
    /// Heading [deg]
    yaw: f64,
    /// Speed [mph]
    speed: f64,
    previous_path_x: Vec<f64>,
    previous_path_y: Vec<f64>,
    end_path_s: f64,
    end_path_d: f64,
    sensor_fusion: Vec<Vec<f64>>,
}

impl TelemetryMessage {
    fn into_tick_input(self) -> PlannerResult<TickInput> {
        if self.previous_path_x.len() != self.previous_path_y.len() {
            return Err(PlannerError::MalformedInput(format!(
                "previous path has {} x and {} y values",
                self.previous_path_x.len(),
                self.previous_path_y.len()
            )));
        }
        let vehicles = self
            .sensor_fusion
            .iter()
            .enumerate()
            .map(|(i, row)| {
                if row.len() != SENSOR_FIELDS {
                    return Err(PlannerError::MalformedInput(format!(
                        "sensor_fusion[{}] has {} fields, expected {}",
                        i,
                        row.len(),
                        SENSOR_FIELDS
                    )));
                }
                Ok(TrackedVehicle::new(row[0] as i64, row[1], row[2], row[3], row[4], row[5], row[6]))
            })
            .collect::<PlannerResult<Vec<_>>>()?;

        let ego = EgoState::new(self.x, self.y, self.s, self.d, self.yaw.to_radians(), self.speed);
        let previous_path = Path2D::from_xy(&self.previous_path_x, &self.previous_path_y);
        Ok(TickInput::new(ego, previous_path, self.end_path_s, self.end_path_d, vehicles))
    }
}

/// JSON array part of an event frame, or `None` for frames without data
pub fn extract_payload(frame: &str) -> Option<&str> {
    if !frame.starts_with(EVENT_PREFIX) {
        return None;
    }
    let body = &frame[EVENT_PREFIX.len()..];
    if body.contains("null") {
        return None;
    }
    let start = body.find('[')?;
    let end = body.rfind(']')?;
    if end > start {
        Some(&body[start..=end])
    } else {
        None
    }
}

/// Decode an event payload such as `["telemetry", {...}]`
pub fn parse_event(payload: &str) -> PlannerResult<Event> {
    let value: Value = serde_json::from_str(payload)?;
    let (name, data) = match value.as_array().map(|a| a.as_slice()) {
        Some([Value::String(name), data, ..]) => (name.clone(), data.clone()),
        Some([Value::String(name)]) => (name.clone(), Value::Null),
        _ => {
            return Err(PlannerError::ParseError(
                "event payload must be [name, data]".to_string(),
            ))
        }
    };
    if name != "telemetry" {
        return Ok(Event::Other(name));
    }
    let message: TelemetryMessage =
        serde_json::from_value(data).map_err(|e| PlannerError::MalformedInput(e.to_string()))?;
    Ok(Event::Telemetry(message.into_tick_input()?))
}

/// Outbound frame carrying the planned path
pub fn control_message(path: &Path2D) -> String {
    let body = json!(["control", { "next_x": path.x_coords(), "next_y": path.y_coords() }]);
    format!("{}{}", EVENT_PREFIX, body)
}

/// Outbound frame telling the simulator to drive manually
pub fn manual_message() -> String {
    format!("{}{}", EVENT_PREFIX, json!(["manual", {}]))
}

/// Processes frames one at a time, owning the state carried between ticks.
///
/// Taking `&mut self` per frame means a tick always finishes before the next
/// one starts.
pub struct PlannerSession {
    planner: HighwayPlanner,
    state: PlannerState,
    ticks: u64,
}

impl PlannerSession {
    pub fn new(planner: HighwayPlanner, state: PlannerState) -> Self {
        Self { planner, state, ticks: 0 }
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Handle one inbound frame, returning the reply frame if any.
    ///
    /// Malformed telemetry skips the tick: no reply and the state is kept.
    pub fn handle_frame(&mut self, frame: &str) -> Option<String> {
        if !frame.starts_with(EVENT_PREFIX) {
            return None;
        }
        let payload = match extract_payload(frame) {
            Some(payload) => payload,
            None => return Some(manual_message()),
        };
        match parse_event(payload) {
            Ok(Event::Telemetry(input)) => Some(control_message(&self.tick(&input))),
            Ok(Event::Other(name)) => {
                debug!("ignoring event {}", name);
                None
            }
            Err(e) => {
                warn!("skipping tick: {}", e);
                None
            }
        }
    }

    /// Plan one tick and keep the resulting state
    pub fn tick(&mut self, input: &TickInput) -> Path2D {
        let outcome = self.planner.plan(self.state, input);
        self.state = outcome.state;
        self.ticks += 1;
        outcome.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::common::Point2D;
    use crate::map::WaypointMap;

    fn telemetry_json(map: &WaypointMap) -> Value {
        let p = map.to_cartesian(100.0, 6.0).unwrap();
        let ahead = map.to_cartesian(101.0, 6.0).unwrap();
        json!({
            "x": p.x, "y": p.y, "s": 100.0, "d": 6.0,
            "yaw": p.bearing_to(&ahead).to_degrees(), "speed": 0.0,
            "previous_path_x": [], "previous_path_y": [],
            "end_path_s": 0.0, "end_path_d": 0.0,
            "sensor_fusion": [[0, 1000.0, 1500.0, 10.0, 0.0, 160.0, 2.0]]
        })
    }

    fn session() -> (PlannerSession, Arc<WaypointMap>) {
        let map = Arc::new(WaypointMap::circular(Point2D::new(1000.0, 2000.0), 500.0, 120).unwrap());
        let planner = HighwayPlanner::with_defaults(map.clone());
        (PlannerSession::new(planner, PlannerState::default()), map)
    }

    #[test]
    fn test_extract_payload() {
        assert_eq!(extract_payload("42[\"telemetry\",{\"a\":[1]}]"), Some("[\"telemetry\",{\"a\":[1]}]"));
        assert_eq!(extract_payload("42[\"telemetry\",null]"), None);
        assert_eq!(extract_payload("2probe"), None);
        assert_eq!(extract_payload("42"), None);
    }

    #[test]
    fn test_parse_telemetry_event() {
        let (_, map) = session();
        let payload = json!(["telemetry", telemetry_json(&map)]).to_string();
        match parse_event(&payload).unwrap() {
            Event::Telemetry(input) => {
                assert_eq!(input.vehicles.len(), 1);
                assert_eq!(input.vehicles[0].s, 160.0);
                assert!(input.previous_path.is_empty());
                let p = map.to_cartesian(100.0, 6.0).unwrap();
                let ahead = map.to_cartesian(101.0, 6.0).unwrap();
                assert!((input.ego.yaw - p.bearing_to(&ahead)).abs() < 1e-9);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_parse_other_event() {
        assert_eq!(parse_event("[\"ping\", {}]").unwrap(), Event::Other("ping".to_string()));
        assert!(matches!(parse_event("{\"a\": 1}"), Err(PlannerError::ParseError(_))));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let (_, map) = session();
        let mut data = telemetry_json(&map);
        data.as_object_mut().unwrap().remove("end_path_s");
        let payload = json!(["telemetry", data]).to_string();
        assert!(matches!(parse_event(&payload), Err(PlannerError::MalformedInput(_))));
    }

    #[test]
    fn test_bad_sensor_row_is_malformed() {
        let (_, map) = session();
        let mut data = telemetry_json(&map);
        data["sensor_fusion"] = json!([[0, 1.0, 2.0]]);
        let payload = json!(["telemetry", data]).to_string();
        assert!(matches!(parse_event(&payload), Err(PlannerError::MalformedInput(_))));

        let mut data = telemetry_json(&map);
        data["speed"] = json!("fast");
        let payload = json!(["telemetry", data]).to_string();
        assert!(matches!(parse_event(&payload), Err(PlannerError::MalformedInput(_))));

        let mut data = telemetry_json(&map);
        data["previous_path_x"] = json!([1.0]);
        let payload = json!(["telemetry", data]).to_string();
        assert!(matches!(parse_event(&payload), Err(PlannerError::MalformedInput(_))));
    }

    #[test]
    fn test_control_message_format() {
        let path = Path2D::from_xy(&[1.0, 2.5], &[3.0, 4.0]);
        assert_eq!(control_message(&path), "42[\"control\",{\"next_x\":[1.0,2.5],\"next_y\":[3.0,4.0]}]");
        assert_eq!(manual_message(), "42[\"manual\",{}]");
    }

    #[test]
    fn test_session_round_trip() {
        let (mut session, map) = session();
        let frame = format!("42{}", json!(["telemetry", telemetry_json(&map)]));
        let reply = session.handle_frame(&frame).unwrap();
        assert!(reply.starts_with("42[\"control\""));
        let value: Value = serde_json::from_str(extract_payload(&reply).unwrap()).unwrap();
        assert_eq!(value[1]["next_x"].as_array().unwrap().len(), 50);
        assert_eq!(session.ticks(), 1);
        assert!((session.state().reference_speed - 0.224).abs() < 1e-12);
    }

    #[test]
    fn test_session_skips_malformed_tick() {
        let (mut session, map) = session();
        let mut data = telemetry_json(&map);
        data.as_object_mut().unwrap().remove("x");
        let frame = format!("42{}", json!(["telemetry", data]));
        assert_eq!(session.handle_frame(&frame), None);
        assert_eq!(session.ticks(), 0);
        assert_eq!(session.state(), PlannerState::default());
        assert_eq!(session.handle_frame("42[\"telemetry\",null]"), Some(manual_message()));
    }
}
