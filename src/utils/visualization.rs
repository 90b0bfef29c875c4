//! Track and traffic plotting with gnuplot
//!
//! Series are collected first and drawn into a single set of axes when the
//! figure is rendered.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{Path2D, Point2D, Pose2D, TrackedVehicle};
use crate::map::WaypointMap;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const BLUE: &str = "#0000FF";
    pub const CYAN: &str = "#00FFFF";
    pub const GRAY: &str = "#808080";
    pub const ORANGE: &str = "#FFA500";

    pub const ROAD_EDGE: &str = BLACK;
    pub const LANE_LINE: &str = GRAY;
    pub const PLANNED: &str = RED;
    pub const DRIVEN: &str = BLUE;
    pub const EGO: &str = CYAN;
    pub const TRAFFIC: &str = ORANGE;
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::new(colors::PLANNED, "Planned path")
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

#[derive(Debug, Clone)]
enum Series {
    Lines { x: Vec<f64>, y: Vec<f64>, style: PathStyle },
    Points { x: Vec<f64>, y: Vec<f64>, style: PointStyle },
}

pub struct Visualizer {
    series: Vec<Series>,
    title: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    /// Spacing of the samples used to draw the road [m]
    track_resolution: f64,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            series: Vec::new(),
            title: String::new(),
            x_range: None,
            y_range: None,
            track_resolution: 5.0,
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn set_x_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.x_range = Some((min, max));
        self
    }

    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    pub fn set_track_resolution(&mut self, resolution: f64) -> &mut Self {
        self.track_resolution = resolution;
        self
    }

    /// Zoom to a square window centred on `center`
    pub fn focus(&mut self, center: Point2D, half_width: f64) -> &mut Self {
        self.set_x_range(center.x - half_width, center.x + half_width);
        self.set_y_range(center.y - half_width, center.y + half_width)
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Road edges and lane lines, sampled along s
    pub fn plot_track(&mut self, map: &WaypointMap) -> &mut Self {
        let config = map.config().clone();
        let lanes = config.lane_count;
        for boundary in 0..=lanes {
            let d = boundary as f64 * config.lane_width;
            let line = track_line(map, d, self.track_resolution);
            let style = if boundary == 0 || boundary == lanes {
                PathStyle::new(colors::ROAD_EDGE, if boundary == 0 { "Road edge" } else { "" })
                    .with_line_width(1.5)
            } else {
                PathStyle::new(colors::LANE_LINE, "").with_line_width(0.5)
            };
            self.plot_path(&line, &style);
        }
        self
    }

    pub fn plot_path(&mut self, path: &Path2D, style: &PathStyle) -> &mut Self {
        self.series.push(Series::Lines {
            x: path.x_coords(),
            y: path.y_coords(),
            style: style.clone(),
        });
        self
    }

    pub fn plot_points(&mut self, points: &[Point2D], style: &PointStyle) -> &mut Self {
        self.series.push(Series::Points {
            x: points.iter().map(|p| p.x).collect(),
            y: points.iter().map(|p| p.y).collect(),
            style: style.clone(),
        });
        self
    }

    pub fn plot_vehicles(&mut self, vehicles: &[TrackedVehicle]) -> &mut Self {
        let points: Vec<Point2D> = vehicles.iter().map(|v| Point2D::new(v.x, v.y)).collect();
        self.plot_points(&points, &PointStyle::new(colors::TRAFFIC, "Traffic").with_symbol('S'))
    }

    /// Ego position with a short heading line
    pub fn plot_ego(&mut self, pose: &Pose2D) -> &mut Self {
        let nose = Point2D::new(pose.x + 5.0 * pose.yaw.cos(), pose.y + 5.0 * pose.yaw.sin());
        self.plot_points(&[pose.position()], &PointStyle::new(colors::EGO, "Ego").with_size(1.5));
        self.plot_path(
            &Path2D::from_points(vec![pose.position(), nose]),
            &PathStyle::new(colors::EGO, ""),
        )
    }

    pub fn show(&mut self) -> Result<(), String> {
        let mut figure = self.render();
        figure.show().map_err(|e| e.to_string()).map(|_| ())
    }

    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> Result<(), String> {
        let mut figure = self.render();
        figure.save_to_png(path, width, height).map_err(|e| e.to_string())
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        {
            let axes = figure.axes2d();
            for series in &self.series {
                match series {
                    Series::Lines { x, y, style } => {
                        axes.lines(x, y, &[
                            Caption(&style.caption),
                            Color(&style.color),
                            LineWidth(style.line_width),
                        ]);
                    }
                    Series::Points { x, y, style } => {
                        axes.points(x, y, &[
                            Caption(&style.caption),
                            Color(&style.color),
                            PointSymbol(style.symbol),
                            PointSize(style.size),
                        ]);
                    }
                }
            }
            if !self.title.is_empty() {
                axes.set_title(&self.title, &[]);
            }
            axes.set_x_label("X [m]", &[]);
            axes.set_y_label("Y [m]", &[]);
            if let Some((min, max)) = self.x_range {
                axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
            }
            if let Some((min, max)) = self.y_range {
                axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
            }
            axes.set_aspect_ratio(AutoOption::Fix(1.0));
        }
        figure
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Closed polyline at constant lateral offset `d`
pub fn track_line(map: &WaypointMap, d: f64, resolution: f64) -> Path2D {
    let max_s = map.max_s();
    let count = (max_s / resolution.max(1e-3)).ceil() as usize;
    let mut line = Path2D::from_points(
        (0..count)
            .filter_map(|i| map.to_cartesian(i as f64 * max_s / count as f64, d).ok())
            .collect(),
    );
    if let Some(first) = line.points.first().copied() {
        line.push(first);
    }
    line
}
