//! Location types: stations, stops, points of interest and addresses.

use std::sync::Arc;

use serde::Serialize;

use super::{DomainError, Line, ProductFlags};

/// A WGS84 coordinate.
///
/// # Examples
///
/// ```
/// use hafas_client::domain::Coordinate;
///
/// let alex = Coordinate::new(52.521508, 13.411267).unwrap();
/// assert_eq!(alex.latitude, 52.521508);
///
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// assert!(Coordinate::new(f64::NAN, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::InvalidCoordinate("latitude must be within -90..=90"));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::InvalidCoordinate(
                "longitude must be within -180..=180",
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Linear interpolation towards `other`; `fraction` is clamped to 0..=1.
    pub fn interpolate(&self, other: &Coordinate, fraction: f64) -> Coordinate {
        let f = fraction.clamp(0.0, 1.0);
        Coordinate {
            latitude: self.latitude + (other.latitude - self.latitude) * f,
            longitude: self.longitude + (other.longitude - self.longitude) * f,
        }
    }
}

/// A station: a named group of stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<ProductFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<Arc<Line>>>,
}

impl Station {
    /// Creates a station; the identifier must be non-empty.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::MissingIdentifier("station"));
        }
        Ok(Self {
            id,
            name: name.into(),
            coordinate: None,
            products: None,
            lines: None,
        })
    }
}

/// A stop, optionally belonging to a parent station.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<ProductFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<Arc<Line>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station: Option<Arc<Station>>,
}

impl Stop {
    /// Creates a stop; the identifier must be non-empty.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::MissingIdentifier("stop"));
        }
        Ok(Self {
            id,
            name: name.into(),
            coordinate: None,
            products: None,
            lines: None,
            station: None,
        })
    }
}

/// A point of interest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Poi {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub coordinate: Coordinate,
}

/// A street address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Address {
    pub address: String,
    pub coordinate: Coordinate,
}

/// Any location the backend can return or accept.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Location {
    Station(Station),
    Stop(Stop),
    Poi(Poi),
    Address(Address),
}

impl Location {
    /// The provider-specific identifier, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            Location::Station(s) => Some(&s.id),
            Location::Stop(s) => Some(&s.id),
            Location::Poi(p) => p.id.as_deref(),
            Location::Address(_) => None,
        }
    }

    /// Display name (the address text for addresses).
    pub fn name(&self) -> &str {
        match self {
            Location::Station(s) => &s.name,
            Location::Stop(s) => &s.name,
            Location::Poi(p) => &p.name,
            Location::Address(a) => &a.address,
        }
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            Location::Station(s) => s.coordinate,
            Location::Stop(s) => s.coordinate,
            Location::Poi(p) => Some(p.coordinate),
            Location::Address(a) => Some(a.coordinate),
        }
    }

    pub fn is_station(&self) -> bool {
        matches!(self, Location::Station(_))
    }

    /// Returns true for stations and stops.
    pub fn is_stop_like(&self) -> bool {
        matches!(self, Location::Station(_) | Location::Stop(_))
    }

    /// Views a station or stop as a station, keeping every field.
    ///
    /// Returns `None` for POIs and addresses.
    pub fn to_station(&self) -> Option<Station> {
        match self {
            Location::Station(s) => Some(s.clone()),
            Location::Stop(s) => Some(Station {
                id: s.id.clone(),
                name: s.name.clone(),
                coordinate: s.coordinate,
                products: s.products.clone(),
                lines: s.lines.clone(),
            }),
            _ => None,
        }
    }

    /// Promotes a stop to a station. Other variants are returned unchanged.
    pub fn promote_to_station(self) -> Location {
        match self {
            Location::Stop(stop) => Location::Station(Station {
                id: stop.id,
                name: stop.name,
                coordinate: stop.coordinate,
                products: stop.products,
                lines: stop.lines,
            }),
            other => other,
        }
    }
}

/// A location found near a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyLocation {
    pub location: Arc<Location>,
    /// Walking distance in metres.
    pub distance: Option<u32>,
}

/// Stations reachable within the same travel duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReachableGroup {
    /// Travel duration in minutes.
    pub duration: u32,
    pub stations: Vec<Arc<Location>>,
}

/// A decoded track shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polyline {
    pub points: Vec<Coordinate>,
}
