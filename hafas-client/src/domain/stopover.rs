//! Stopovers and station board entries.

use std::sync::Arc;

use serde::Serialize;

use super::{Event, Line, Location, Remark};

/// A stop visited along a trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stopover {
    pub stop: Option<Arc<Location>>,
    /// Empty at the first stop of a trip
    #[serde(skip_serializing_if = "Event::is_empty")]
    pub arrival: Event,
    /// Empty at the last stop of a trip
    #[serde(skip_serializing_if = "Event::is_empty")]
    pub departure: Event,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
    /// The vehicle passes without stopping.
    #[serde(skip)]
    pub pass_by: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remarks: Vec<Arc<Remark>>,
}

/// One row of a departure or arrival board.
///
/// For departures `direction` is the heading and `stopovers` are the stops
/// still to come; for arrivals `direction` is `None` and `stopovers` are the
/// stops already served.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationBoardEntry {
    pub trip_id: String,
    pub stop: Option<Arc<Location>>,
    pub line: Option<Arc<Line>>,
    pub direction: Option<String>,
    #[serde(flatten)]
    pub event: Event,
    pub remarks: Vec<Arc<Remark>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopovers: Option<Vec<Stopover>>,
}

pub type Departure = StationBoardEntry;
pub type Arrival = StationBoardEntry;
