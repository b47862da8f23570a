//! Live vehicle positions.

use std::sync::Arc;

use serde::Serialize;

use super::{Coordinate, Line, Location, Polyline, Stopover, Timestamp};

/// A forecast position of a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub origin: Option<Arc<Location>>,
    pub destination: Option<Arc<Location>>,
    /// Absolute time of this frame.
    pub t: Timestamp,
    /// Progress from origin to destination, 0..=1.
    pub progress: Option<f64>,
    /// Position interpolated between origin and destination.
    pub coordinate: Option<Coordinate>,
}

/// A vehicle on the move, as returned by a radar query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub trip_id: String,
    pub direction: Option<String>,
    pub line: Option<Arc<Line>>,
    pub location: Option<Coordinate>,
    pub next_stopovers: Vec<Stopover>,
    pub frames: Vec<Frame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyline: Option<Arc<Polyline>>,
}
