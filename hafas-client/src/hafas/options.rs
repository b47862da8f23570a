//! Caller options, validated before any request is built.
//!
//! Every operation takes an options struct with the backend's usual
//! defaults. Options are plain values built with `with_*` methods and are
//! never mutated by the client; `validate` runs synchronously and fails
//! fast, so a rejected call never reaches the transport.

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;

use crate::domain::{Location, ProductFlags, Timestamp};

use super::error::HafasError;

fn ensure_positive(name: &str, value: u32) -> Result<(), HafasError> {
    if value == 0 {
        return Err(HafasError::validation(format!("{name} must be greater than 0")));
    }
    Ok(())
}

fn ensure_non_empty(name: &str, value: &str) -> Result<(), HafasError> {
    if value.trim().is_empty() {
        return Err(HafasError::validation(format!("{name} must be a non-empty string")));
    }
    Ok(())
}

/// Parses an RFC 3339 timestamp supplied by a caller.
pub fn parse_when(value: &str) -> Result<Timestamp, HafasError> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| HafasError::validation(format!("invalid time {value:?}: {e}")))
}

/// Walking speed for transfers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WalkingSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl WalkingSpeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalkingSpeed::Slow => "slow",
            WalkingSpeed::Normal => "normal",
            WalkingSpeed::Fast => "fast",
        }
    }
}

impl fmt::Display for WalkingSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WalkingSpeed {
    type Err = HafasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slow" => Ok(WalkingSpeed::Slow),
            "normal" => Ok(WalkingSpeed::Normal),
            "fast" => Ok(WalkingSpeed::Fast),
            other => Err(HafasError::validation(format!(
                "walking speed must be one of slow, normal, fast (got {other:?})"
            ))),
        }
    }
}

/// Required level of barrier-free access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Accessibility {
    #[default]
    None,
    Partial,
    Complete,
}

impl Accessibility {
    /// `META` filter value, if any.
    pub fn meta(&self) -> Option<&'static str> {
        match self {
            Accessibility::None => None,
            Accessibility::Partial => Some("limitedBarrierfree"),
            Accessibility::Complete => Some("completeBarrierfree"),
        }
    }
}

impl FromStr for Accessibility {
    type Err = HafasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Accessibility::None),
            "partial" => Ok(Accessibility::Partial),
            "complete" => Ok(Accessibility::Complete),
            other => Err(HafasError::validation(format!(
                "accessibility must be one of none, partial, complete (got {other:?})"
            ))),
        }
    }
}

/// Geographic rectangle for radar queries.
///
/// # Examples
///
/// ```
/// use hafas_client::hafas::options::BoundingBox;
///
/// assert!(BoundingBox::new(52.52, 13.37, 52.50, 13.40).is_ok());
/// // north must be larger than south
/// assert!(BoundingBox::new(52.50, 13.37, 52.52, 13.40).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    north: f64,
    west: f64,
    south: f64,
    east: f64,
}

impl BoundingBox {
    pub fn new(north: f64, west: f64, south: f64, east: f64) -> Result<Self, HafasError> {
        for (name, v) in [("north", north), ("west", west), ("south", south), ("east", east)] {
            if !v.is_finite() {
                return Err(HafasError::validation(format!("{name} must be a finite number")));
            }
        }
        if north <= south {
            return Err(HafasError::validation("north must be larger than south"));
        }
        if east <= west {
            return Err(HafasError::validation("east must be larger than west"));
        }
        Ok(Self {
            north,
            west,
            south,
            east,
        })
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn east(&self) -> f64 {
        self.east
    }
}

/// Options for `departures` and `arrivals`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeparturesOptions {
    /// Defaults to now.
    pub when: Option<Timestamp>,
    /// Only vehicles heading to this station id (departures only).
    pub direction: Option<String>,
    /// Minutes ahead to look.
    pub duration: u32,
    pub products: ProductFlags,
    pub stopovers: bool,
    pub remarks: bool,
    pub station_lines: bool,
    /// Include stations grouped with this one.
    pub include_related_stations: bool,
}

pub type ArrivalsOptions = DeparturesOptions;

impl Default for DeparturesOptions {
    fn default() -> Self {
        Self {
            when: None,
            direction: None,
            duration: 10,
            products: ProductFlags::new(),
            stopovers: false,
            remarks: true,
            station_lines: false,
            include_related_stations: true,
        }
    }
}

impl DeparturesOptions {
    pub fn with_when(mut self, when: Timestamp) -> Self {
        self.when = Some(when);
        self
    }

    pub fn with_direction(mut self, station_id: impl Into<String>) -> Self {
        self.direction = Some(station_id.into());
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration = minutes;
        self
    }

    pub fn with_products(mut self, products: ProductFlags) -> Self {
        self.products = products;
        self
    }

    pub fn with_stopovers(mut self, stopovers: bool) -> Self {
        self.stopovers = stopovers;
        self
    }

    pub fn with_remarks(mut self, remarks: bool) -> Self {
        self.remarks = remarks;
        self
    }

    pub fn with_station_lines(mut self, station_lines: bool) -> Self {
        self.station_lines = station_lines;
        self
    }

    pub fn with_related_stations(mut self, include: bool) -> Self {
        self.include_related_stations = include;
        self
    }

    pub fn validate(&self) -> Result<(), HafasError> {
        ensure_positive("duration", self.duration)?;
        if let Some(direction) = &self.direction {
            ensure_non_empty("direction", direction)?;
        }
        Ok(())
    }
}

/// Where a trip search starts.
#[derive(Debug, Clone, PartialEq)]
pub enum JourneyStart {
    Now,
    DepartAt(Timestamp),
    ArriveBy(Timestamp),
    /// Cursor from a previous `earlier_ref`.
    EarlierThan(String),
    /// Cursor from a previous `later_ref`.
    LaterThan(String),
}

impl JourneyStart {
    pub fn cursor(&self) -> Option<&str> {
        match self {
            JourneyStart::EarlierThan(c) | JourneyStart::LaterThan(c) => Some(c),
            _ => None,
        }
    }

    /// Searching by arrival time.
    pub fn is_arrival(&self) -> bool {
        matches!(self, JourneyStart::ArriveBy(_))
    }

    pub fn time(&self) -> Option<Timestamp> {
        match self {
            JourneyStart::DepartAt(t) | JourneyStart::ArriveBy(t) => Some(*t),
            _ => None,
        }
    }
}

/// Options for `journeys`.
#[derive(Debug, Clone, PartialEq)]
pub struct JourneysOptions {
    pub departure: Option<Timestamp>,
    pub arrival: Option<Timestamp>,
    pub earlier_than: Option<String>,
    pub later_than: Option<String>,
    /// Number of journeys to collect; `None` returns one backend page.
    pub results: Option<usize>,
    pub via: Option<Location>,
    pub stopovers: bool,
    /// Maximum number of transfers.
    pub transfers: u32,
    /// Minimum transfer time in minutes.
    pub transfer_time: u32,
    pub accessibility: Accessibility,
    /// Only journeys allowing bicycles.
    pub bike: bool,
    pub tickets: bool,
    pub polylines: bool,
    pub remarks: bool,
    pub walking_speed: WalkingSpeed,
    /// Consider walking to nearby stations at the start.
    pub start_with_walking: bool,
    pub products: ProductFlags,
}

impl Default for JourneysOptions {
    fn default() -> Self {
        Self {
            departure: None,
            arrival: None,
            earlier_than: None,
            later_than: None,
            results: None,
            via: None,
            stopovers: false,
            transfers: 5,
            transfer_time: 0,
            accessibility: Accessibility::None,
            bike: false,
            tickets: false,
            polylines: false,
            remarks: true,
            walking_speed: WalkingSpeed::Normal,
            start_with_walking: true,
            products: ProductFlags::new(),
        }
    }
}

impl JourneysOptions {
    pub fn with_departure(mut self, when: Timestamp) -> Self {
        self.departure = Some(when);
        self
    }

    pub fn with_arrival(mut self, when: Timestamp) -> Self {
        self.arrival = Some(when);
        self
    }

    pub fn with_earlier_than(mut self, cursor: impl Into<String>) -> Self {
        self.earlier_than = Some(cursor.into());
        self
    }

    pub fn with_later_than(mut self, cursor: impl Into<String>) -> Self {
        self.later_than = Some(cursor.into());
        self
    }

    pub fn with_results(mut self, results: usize) -> Self {
        self.results = Some(results);
        self
    }

    pub fn with_via(mut self, via: Location) -> Self {
        self.via = Some(via);
        self
    }

    pub fn with_stopovers(mut self, stopovers: bool) -> Self {
        self.stopovers = stopovers;
        self
    }

    pub fn with_transfers(mut self, transfers: u32) -> Self {
        self.transfers = transfers;
        self
    }

    pub fn with_transfer_time(mut self, minutes: u32) -> Self {
        self.transfer_time = minutes;
        self
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn with_bike(mut self, bike: bool) -> Self {
        self.bike = bike;
        self
    }

    pub fn with_tickets(mut self, tickets: bool) -> Self {
        self.tickets = tickets;
        self
    }

    pub fn with_polylines(mut self, polylines: bool) -> Self {
        self.polylines = polylines;
        self
    }

    pub fn with_remarks(mut self, remarks: bool) -> Self {
        self.remarks = remarks;
        self
    }

    pub fn with_walking_speed(mut self, speed: WalkingSpeed) -> Self {
        self.walking_speed = speed;
        self
    }

    pub fn with_start_with_walking(mut self, start_with_walking: bool) -> Self {
        self.start_with_walking = start_with_walking;
        self
    }

    pub fn with_products(mut self, products: ProductFlags) -> Self {
        self.products = products;
        self
    }

    /// Checks mutually exclusive options and resolves the search start.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::DateTime;
    /// use hafas_client::hafas::options::JourneysOptions;
    ///
    /// let t = DateTime::parse_from_rfc3339("2024-03-15T10:00:00+01:00").unwrap();
    /// let opts = JourneysOptions::default().with_departure(t).with_arrival(t);
    /// assert!(opts.validate().is_err());
    /// ```
    pub fn validate(self) -> Result<JourneysQuery, HafasError> {
        if self.earlier_than.is_some() && self.later_than.is_some() {
            return Err(HafasError::validation(
                "earlier_than and later_than are mutually exclusive",
            ));
        }
        if self.departure.is_some() && self.arrival.is_some() {
            return Err(HafasError::validation(
                "departure and arrival are mutually exclusive",
            ));
        }
        let has_time = self.departure.is_some() || self.arrival.is_some();
        for (name, cursor) in [
            ("earlier_than", &self.earlier_than),
            ("later_than", &self.later_than),
        ] {
            if let Some(cursor) = cursor {
                ensure_non_empty(name, cursor)?;
                if has_time {
                    return Err(HafasError::validation(format!(
                        "{name} and departure/arrival are mutually exclusive"
                    )));
                }
            }
        }
        if self.results == Some(0) {
            return Err(HafasError::validation("results must be greater than 0"));
        }

        let start = match (&self.earlier_than, &self.later_than) {
            (Some(c), _) => JourneyStart::EarlierThan(c.clone()),
            (_, Some(c)) => JourneyStart::LaterThan(c.clone()),
            _ => match (self.departure, self.arrival) {
                (Some(t), _) => JourneyStart::DepartAt(t),
                (_, Some(t)) => JourneyStart::ArriveBy(t),
                _ => JourneyStart::Now,
            },
        };

        Ok(JourneysQuery {
            start,
            options: self,
        })
    }
}

/// Validated `journeys` configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct JourneysQuery {
    start: JourneyStart,
    options: JourneysOptions,
}

impl JourneysQuery {
    pub fn start(&self) -> &JourneyStart {
        &self.start
    }

    pub fn options(&self) -> &JourneysOptions {
        &self.options
    }
}

/// Options for `refresh_journey`.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshJourneyOptions {
    pub stopovers: bool,
    pub tickets: bool,
    pub polylines: bool,
    pub remarks: bool,
}

impl Default for RefreshJourneyOptions {
    fn default() -> Self {
        Self {
            stopovers: false,
            tickets: false,
            polylines: false,
            remarks: true,
        }
    }
}

impl RefreshJourneyOptions {
    pub fn with_stopovers(mut self, stopovers: bool) -> Self {
        self.stopovers = stopovers;
        self
    }

    pub fn with_polylines(mut self, polylines: bool) -> Self {
        self.polylines = polylines;
        self
    }

    pub fn with_remarks(mut self, remarks: bool) -> Self {
        self.remarks = remarks;
        self
    }
}

/// Options for `locations`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationsOptions {
    /// Append the backend's fuzzy marker to the query.
    pub fuzzy: bool,
    pub results: u32,
    pub stations: bool,
    pub addresses: bool,
    pub poi: bool,
    pub station_lines: bool,
}

impl Default for LocationsOptions {
    fn default() -> Self {
        Self {
            fuzzy: true,
            results: 10,
            stations: true,
            addresses: true,
            poi: true,
            station_lines: false,
        }
    }
}

impl LocationsOptions {
    pub fn with_fuzzy(mut self, fuzzy: bool) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    pub fn with_results(mut self, results: u32) -> Self {
        self.results = results;
        self
    }

    pub fn with_types(mut self, stations: bool, addresses: bool, poi: bool) -> Self {
        self.stations = stations;
        self.addresses = addresses;
        self.poi = poi;
        self
    }

    pub fn with_station_lines(mut self, station_lines: bool) -> Self {
        self.station_lines = station_lines;
        self
    }

    pub fn validate(&self) -> Result<(), HafasError> {
        ensure_positive("results", self.results)?;
        if !(self.stations || self.addresses || self.poi) {
            return Err(HafasError::validation(
                "at least one of stations, addresses, poi must be enabled",
            ));
        }
        Ok(())
    }
}

/// Options for `station`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationOptions {
    pub station_lines: bool,
}

impl StationOptions {
    pub fn with_station_lines(mut self, station_lines: bool) -> Self {
        self.station_lines = station_lines;
        self
    }
}

/// Options for `nearby`.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyOptions {
    pub results: u32,
    /// Maximum walking distance in metres.
    pub distance: Option<u32>,
    pub poi: bool,
    pub stations: bool,
    pub station_lines: bool,
}

impl Default for NearbyOptions {
    fn default() -> Self {
        Self {
            results: 8,
            distance: None,
            poi: false,
            stations: true,
            station_lines: false,
        }
    }
}

impl NearbyOptions {
    pub fn with_results(mut self, results: u32) -> Self {
        self.results = results;
        self
    }

    pub fn with_distance(mut self, metres: u32) -> Self {
        self.distance = Some(metres);
        self
    }

    pub fn with_poi(mut self, poi: bool) -> Self {
        self.poi = poi;
        self
    }

    pub fn with_stations(mut self, stations: bool) -> Self {
        self.stations = stations;
        self
    }

    pub fn validate(&self) -> Result<(), HafasError> {
        ensure_positive("results", self.results)?;
        if let Some(distance) = self.distance {
            ensure_positive("distance", distance)?;
        }
        Ok(())
    }
}

/// Options for `trip`.
#[derive(Debug, Clone, PartialEq)]
pub struct TripOptions {
    pub stopovers: bool,
    pub polyline: bool,
    pub remarks: bool,
}

impl Default for TripOptions {
    fn default() -> Self {
        Self {
            stopovers: true,
            polyline: false,
            remarks: true,
        }
    }
}

impl TripOptions {
    pub fn with_stopovers(mut self, stopovers: bool) -> Self {
        self.stopovers = stopovers;
        self
    }

    pub fn with_polyline(mut self, polyline: bool) -> Self {
        self.polyline = polyline;
        self
    }

    pub fn with_remarks(mut self, remarks: bool) -> Self {
        self.remarks = remarks;
        self
    }
}

/// Options for `radar`.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarOptions {
    pub when: Option<Timestamp>,
    /// Maximum number of vehicles.
    pub results: u32,
    /// Seconds of forecast frames to compute.
    pub duration: u32,
    /// Number of frames.
    pub frames: u32,
    pub products: ProductFlags,
    pub polylines: bool,
}

impl Default for RadarOptions {
    fn default() -> Self {
        Self {
            when: None,
            results: 256,
            duration: 30,
            frames: 3,
            products: ProductFlags::new(),
            polylines: false,
        }
    }
}

impl RadarOptions {
    pub fn with_when(mut self, when: Timestamp) -> Self {
        self.when = Some(when);
        self
    }

    pub fn with_results(mut self, results: u32) -> Self {
        self.results = results;
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration = seconds;
        self
    }

    pub fn with_frames(mut self, frames: u32) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_polylines(mut self, polylines: bool) -> Self {
        self.polylines = polylines;
        self
    }

    pub fn validate(&self) -> Result<(), HafasError> {
        ensure_positive("results", self.results)?;
        ensure_positive("duration", self.duration)?;
        ensure_positive("frames", self.frames)
    }

    /// Milliseconds between two frames.
    pub fn step_millis(&self) -> u64 {
        (u64::from(self.duration) * 1000) / u64::from(self.frames.max(1))
    }
}

/// Options for `reachable_from`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReachableFromOptions {
    pub when: Option<Timestamp>,
    pub max_transfers: u32,
    /// Minutes.
    pub max_duration: u32,
    pub products: ProductFlags,
}

impl Default for ReachableFromOptions {
    fn default() -> Self {
        Self {
            when: None,
            max_transfers: 5,
            max_duration: 20,
            products: ProductFlags::new(),
        }
    }
}

impl ReachableFromOptions {
    pub fn with_when(mut self, when: Timestamp) -> Self {
        self.when = Some(when);
        self
    }

    pub fn with_max_transfers(mut self, max_transfers: u32) -> Self {
        self.max_transfers = max_transfers;
        self
    }

    pub fn with_max_duration(mut self, minutes: u32) -> Self {
        self.max_duration = minutes;
        self
    }

    pub fn validate(&self) -> Result<(), HafasError> {
        ensure_positive("max_duration", self.max_duration)
    }
}
