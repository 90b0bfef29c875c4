// Renders a waypoint track with its lane lines to SVG.
//
// usage: track_plot [waypoints.csv] [output.svg]
use std::env;
use std::sync::Arc;

use plotlib::page::Page;
use plotlib::repr::Plot;
use plotlib::style::{LineStyle, PointMarker, PointStyle};
use plotlib::view::ContinuousView;

use highway_planner::utils::visualization::track_line;
use highway_planner::{EgoState, HighwayPlanner, PlannerState, Point2D, TickInput, TrackConfig, WaypointMap};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let map = Arc::new(
        match args.get(0) {
            Some(path) => WaypointMap::load(path, TrackConfig::default()),
            None => WaypointMap::circular(Point2D::new(1000.0, 2000.0), 800.0, 240),
        }
        .unwrap(),
    );
    let output = args.get(1).map(String::as_str).unwrap_or("./img/track.svg");

    let waypoints: Vec<(f64, f64)> = map.waypoints().iter().map(|w| (w.x, w.y)).collect();
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for &(x, y) in &waypoints {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    let margin = 50.0;

    let mut view = ContinuousView::new().add(
        Plot::new(waypoints).point_style(PointStyle::new().marker(PointMarker::Circle).colour("#000000").size(1.5)),
    );
    let config = map.config().clone();
    for boundary in 0..=config.lane_count {
        let d = boundary as f64 * config.lane_width;
        let line: Vec<(f64, f64)> = track_line(&map, d, 2.0).points.iter().map(|p| (p.x, p.y)).collect();
        let colour = if boundary == 0 || boundary == config.lane_count { "#35C788" } else { "#808080" };
        view = view.add(Plot::new(line).line_style(LineStyle::new().colour(colour).width(1.0)));
    }

    // one planning horizon from a standing start in the middle lane
    let start = map.to_cartesian(0.0, 6.0).unwrap();
    let heading = start.bearing_to(&map.to_cartesian(1.0, 6.0).unwrap());
    let ego = EgoState::new(start.x, start.y, 0.0, 6.0, heading, 0.0);
    let planner = HighwayPlanner::with_defaults(map.clone());
    let outcome = planner.plan(PlannerState::new(1, 40.0), &TickInput::from_ego(ego, Vec::new()));
    let horizon: Vec<(f64, f64)> = outcome.path.points.iter().map(|p| (p.x, p.y)).collect();
    view = view.add(Plot::new(horizon).line_style(LineStyle::new().colour("#DD3355").width(2.0)));

    let view = view
        .x_range(min_x - margin, max_x + margin)
        .y_range(min_y - margin, max_y + margin)
        .x_label("x [m]")
        .y_label("y [m]");

    Page::single(&view).save(output).unwrap();
}
