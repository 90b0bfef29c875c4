//! Error types for highway_planner

use std::fmt;

/// Main error type for the planner
#[derive(Debug)]
pub enum PlannerError {
    /// A tick's telemetry is missing a required field or carries a non-numeric value
    MalformedInput(String),
    /// Curve-fitting anchors are not usable (non-increasing x, non-finite values)
    DegenerateGeometry(String),
    /// A map query was made outside the map's valid range
    MapQueryOutOfRange(String),
    /// Invalid parameter
    InvalidParameter(String),
    /// Map file or message text could not be parsed
    ParseError(String),
    /// I/O error
    IoError(std::io::Error),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::MalformedInput(msg) => write!(f, "Malformed input: {}", msg),
            PlannerError::DegenerateGeometry(msg) => write!(f, "Degenerate geometry: {}", msg),
            PlannerError::MapQueryOutOfRange(msg) => write!(f, "Map query out of range: {}", msg),
            PlannerError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            PlannerError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            PlannerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlannerError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PlannerError {
    fn from(e: std::io::Error) -> Self {
        PlannerError::IoError(e)
    }
}

impl From<serde_json::Error> for PlannerError {
    fn from(e: serde_json::Error) -> Self {
        PlannerError::ParseError(e.to_string())
    }
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
