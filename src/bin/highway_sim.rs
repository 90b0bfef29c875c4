// Closed-loop highway simulation.
//
// A kinematic stand-in for the driving simulator: the ego car consumes a few
// points of every planned path per cycle while randomly generated traffic
// cruises along its lanes at constant speed.
//
// usage: highway_sim [waypoints.csv] [--plot]
use std::env;
use std::sync::Arc;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use highway_planner::utils::{colors, PathStyle, Visualizer};
use highway_planner::{
    EgoState, HighwayPlanner, Path2D, PlannerState, Point2D, TickInput, TrackConfig,
    TrackedVehicle, WaypointMap, MPH_PER_MPS,
};

const TICK: f64 = 0.02; // [s]
const CYCLES: usize = 3000;
const POINTS_PER_CYCLE: usize = 3;
const TRAFFIC: usize = 14;

#[derive(Debug, Clone, Copy)]
struct SimVehicle {
    id: i64,
    s: f64,
    d: f64,
    speed: f64, // [m/s]
}

impl SimVehicle {
    fn observe(&self, map: &WaypointMap) -> Option<TrackedVehicle> {
        let p = map.to_cartesian(self.s, self.d).ok()?;
        let ahead = map.to_cartesian(map.wrap_s(self.s + 1.0), self.d).ok()?;
        let yaw = p.bearing_to(&ahead);
        Some(TrackedVehicle::new(
            self.id,
            p.x,
            p.y,
            self.speed * yaw.cos(),
            self.speed * yaw.sin(),
            self.s,
            self.d,
        ))
    }

    fn advance(&mut self, map: &WaypointMap, dt: f64) {
        self.s = map.wrap_s(self.s + self.speed * dt);
    }
}

fn spawn_traffic(map: &WaypointMap, ego_s: f64, rng: &mut StdRng) -> Vec<SimVehicle> {
    let speed: Normal<f64> = Normal::new(18.0, 2.5).unwrap();
    let config = map.config();
    (0..TRAFFIC)
        .map(|i| {
            let lane = rng.gen_range(0..config.lane_count);
            SimVehicle {
                id: i as i64,
                s: map.wrap_s(ego_s + 40.0 + rng.gen_range(0.0..map.max_s() - 80.0)),
                d: config.lane_center(lane),
                speed: speed.sample(rng).max(8.0),
            }
        })
        .collect()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let plot = args.iter().any(|a| a == "--plot");
    let map = match args.iter().find(|a| !a.starts_with("--")) {
        Some(path) => WaypointMap::load(path, TrackConfig::default()),
        None => WaypointMap::circular(Point2D::new(1000.0, 2000.0), 800.0, 240),
    };
    let map = Arc::new(map.unwrap_or_else(|e| {
        eprintln!("cannot build track: {}", e);
        std::process::exit(1);
    }));

    let mut rng = StdRng::seed_from_u64(42);
    let mut traffic = spawn_traffic(&map, 0.0, &mut rng);
    let planner = HighwayPlanner::with_defaults(map.clone());
    let mut state = PlannerState::default();

    let start = map.to_cartesian(0.0, 6.0).unwrap();
    let heading = start.bearing_to(&map.to_cartesian(1.0, 6.0).unwrap());
    let mut ego = EgoState::new(start.x, start.y, 0.0, 6.0, heading, 0.0);
    let mut remaining = Path2D::new();
    let (mut end_s, mut end_d) = (0.0, 0.0);

    let mut driven = Path2D::from_points(vec![ego.position()]);
    let mut lane_changes = 0;
    let mut close_calls = 0;
    let mut distance = 0.0;

    for cycle in 0..CYCLES {
        let vehicles: Vec<TrackedVehicle> = traffic.iter().filter_map(|v| v.observe(&map)).collect();
        let input = TickInput::new(ego, remaining, end_s, end_d, vehicles);
        let outcome = planner.plan(state, &input);
        if outcome.state.current_lane != state.current_lane {
            lane_changes += 1;
            info!("cycle {}: lane {} -> {}", cycle, state.current_lane, outcome.state.current_lane);
        }
        if let Some(decision) = outcome.decision {
            debug!("cycle {}: {} at {:.2} mph", cycle, decision.state, decision.reference_speed);
        }
        state = outcome.state;

        let path = outcome.path;
        let eaten = POINTS_PER_CYCLE.min(path.len());
        if eaten == 0 {
            warn!("cycle {}: empty path, stopping", cycle);
            break;
        }
        let mut position = ego.position();
        let mut yaw = ego.yaw;
        for p in &path.points[..eaten] {
            let step = position.distance(p);
            if step > 1e-9 {
                yaw = position.bearing_to(p);
            }
            distance += step;
            position = *p;
            driven.push(position);
        }
        let last_step = if eaten >= 2 {
            path.points[eaten - 2].distance(&path.points[eaten - 1])
        } else {
            0.0
        };
        let (s, d) = map.to_frenet(position.x, position.y, yaw);
        ego = EgoState::new(position.x, position.y, s, d, yaw, last_step / TICK * MPH_PER_MPS);

        remaining = Path2D::from_points(path.points[eaten..].to_vec());
        if remaining.len() >= 2 {
            let last = remaining.points[remaining.len() - 1];
            let before = remaining.points[remaining.len() - 2];
            let (s, d) = map.to_frenet(last.x, last.y, before.bearing_to(&last));
            end_s = s;
            end_d = d;
        }

        for vehicle in traffic.iter_mut() {
            vehicle.advance(&map, TICK * eaten as f64);
            let gap = map.s_delta(ego.s, vehicle.s).abs();
            if gap < 3.0 && (vehicle.d - ego.d).abs() < 2.0 {
                close_calls += 1;
                warn!("cycle {}: vehicle {} within {:.1} m", cycle, vehicle.id, gap);
            }
        }
    }

    let elapsed = CYCLES as f64 * POINTS_PER_CYCLE as f64 * TICK;
    info!(
        "drove {:.0} m in {:.0} s (mean {:.1} mph), {} lane changes, {} close calls",
        distance,
        elapsed,
        distance / elapsed * MPH_PER_MPS,
        lane_changes,
        close_calls
    );

    if plot {
        let mut vis = Visualizer::new();
        vis.set_title("Highway planner");
        vis.plot_track(&map)
            .plot_path(&driven, &PathStyle::new(colors::DRIVEN, "Driven").with_line_width(1.0))
            .plot_vehicles(&traffic.iter().filter_map(|v| v.observe(&map)).collect::<Vec<_>>())
            .plot_ego(&ego.pose());
        if let Err(e) = vis.save_png("./img/highway_sim.png", 1000, 1000) {
            eprintln!("cannot save plot: {}", e);
        }
    }
}
