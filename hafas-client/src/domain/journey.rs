//! Journey types.
//!
//! A `Journey` is a complete trip from origin to destination as computed by
//! the backend: one or more legs, each either a ride on a line or a walk.

use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;

use super::{DomainError, Event, Line, Location, Polyline, Remark, Stopover, Timestamp};

/// A ride on a scheduled line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitLeg {
    pub trip_id: String,
    pub line: Option<Arc<Line>>,
    pub direction: Option<String>,
    pub origin: Option<Arc<Location>>,
    pub destination: Option<Arc<Location>>,
    pub departure: Event,
    pub arrival: Event,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopovers: Option<Vec<Stopover>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyline: Option<Arc<Polyline>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remarks: Vec<Arc<Remark>>,
}

/// A walk or transfer between two locations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkingLeg {
    pub origin: Option<Arc<Location>>,
    pub destination: Option<Arc<Location>>,
    pub departure: Event,
    pub arrival: Event,
    /// Walking distance in metres.
    pub distance: Option<u32>,
}

/// A segment of a journey.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Leg {
    Transit(TransitLeg),
    Walking(WalkingLeg),
}

impl Leg {
    pub fn origin(&self) -> Option<&Arc<Location>> {
        match self {
            Leg::Transit(l) => l.origin.as_ref(),
            Leg::Walking(l) => l.origin.as_ref(),
        }
    }

    pub fn destination(&self) -> Option<&Arc<Location>> {
        match self {
            Leg::Transit(l) => l.destination.as_ref(),
            Leg::Walking(l) => l.destination.as_ref(),
        }
    }

    pub fn departure(&self) -> &Event {
        match self {
            Leg::Transit(l) => &l.departure,
            Leg::Walking(l) => &l.departure,
        }
    }

    pub fn arrival(&self) -> &Event {
        match self {
            Leg::Transit(l) => &l.arrival,
            Leg::Walking(l) => &l.arrival,
        }
    }

    /// Returns the line, if this is a transit leg.
    pub fn line(&self) -> Option<&Arc<Line>> {
        match self {
            Leg::Transit(l) => l.line.as_ref(),
            Leg::Walking(_) => None,
        }
    }

    pub fn is_walking(&self) -> bool {
        matches!(self, Leg::Walking(_))
    }

    /// Best known departure time of this leg.
    pub fn departure_time(&self) -> Option<Timestamp> {
        self.departure().best_when()
    }

    /// Best known arrival time of this leg.
    pub fn arrival_time(&self) -> Option<Timestamp> {
        self.arrival().best_when()
    }
}

/// A complete journey.
///
/// # Invariants
///
/// - At least one leg
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Journey {
    legs: Vec<Leg>,
    /// Opaque token to re-fetch this journey with fresh realtime data.
    refresh_token: Option<String>,
}

impl Journey {
    /// Constructs a journey from its legs.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::EmptyJourney`] if `legs` is empty.
    pub fn new(legs: Vec<Leg>, refresh_token: Option<String>) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyJourney);
        }
        Ok(Self {
            legs,
            refresh_token,
        })
    }

    /// Returns all legs in order.
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn first_leg(&self) -> &Leg {
        // Non-empty by construction
        &self.legs[0]
    }

    pub fn last_leg(&self) -> &Leg {
        &self.legs[self.legs.len() - 1]
    }

    /// Departure time of the first leg.
    pub fn departure_time(&self) -> Option<Timestamp> {
        self.first_leg().departure_time()
    }

    /// Arrival time of the last leg.
    pub fn arrival_time(&self) -> Option<Timestamp> {
        self.last_leg().arrival_time()
    }

    /// Total duration, if both ends are known.
    pub fn duration(&self) -> Option<Duration> {
        Some(self.arrival_time()?.signed_duration_since(self.departure_time()?))
    }

    /// Number of changes between transit legs.
    pub fn change_count(&self) -> usize {
        self.legs
            .iter()
            .filter(|l| !l.is_walking())
            .count()
            .saturating_sub(1)
    }
}

/// A page (or several accumulated pages) of journeys plus cursors.
///
/// The cursors are opaque backend tokens. Pass `earlier_ref` or
/// `later_ref` back verbatim to fetch adjacent results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyList {
    pub journeys: Vec<Journey>,
    pub earlier_ref: Option<String>,
    pub later_ref: Option<String>,
}

impl JourneyList {
    pub fn len(&self) -> usize {
        self.journeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journeys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Journey> {
        self.journeys.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn ts(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn event(s: &str) -> Event {
        Event {
            when: Some(ts(s)),
            delay: Some(0),
            ..Event::default()
        }
    }

    fn transit(dep: &str, arr: &str) -> Leg {
        Leg::Transit(TransitLeg {
            trip_id: "1|1|0|80|15032024".into(),
            line: Some(Arc::new(Line::named("S5"))),
            direction: None,
            origin: None,
            destination: None,
            departure: event(dep),
            arrival: event(arr),
            stopovers: None,
            polyline: None,
            remarks: vec![],
        })
    }

    fn walk(dep: &str, arr: &str) -> Leg {
        Leg::Walking(WalkingLeg {
            origin: None,
            destination: None,
            departure: event(dep),
            arrival: event(arr),
            distance: Some(200),
        })
    }

    #[test]
    fn empty_journey_rejected() {
        assert_eq!(
            Journey::new(vec![], None).unwrap_err(),
            DomainError::EmptyJourney
        );
    }

    #[test]
    fn journey_times_and_changes() {
        let journey = Journey::new(
            vec![
                transit("2024-03-15T10:00:00+01:00", "2024-03-15T10:20:00+01:00"),
                walk("2024-03-15T10:20:00+01:00", "2024-03-15T10:25:00+01:00"),
                transit("2024-03-15T10:30:00+01:00", "2024-03-15T10:50:00+01:00"),
            ],
            Some("T$A=1@O=x@".into()),
        )
        .unwrap();

        assert_eq!(journey.departure_time(), Some(ts("2024-03-15T10:00:00+01:00")));
        assert_eq!(journey.arrival_time(), Some(ts("2024-03-15T10:50:00+01:00")));
        assert_eq!(journey.duration(), Some(Duration::minutes(50)));
        assert_eq!(journey.change_count(), 1);
        assert_eq!(journey.refresh_token(), Some("T$A=1@O=x@"));
        assert!(journey.legs()[1].is_walking());
        assert!(journey.legs()[1].line().is_none());
    }

    #[test]
    fn cancelled_leg_uses_former_scheduled_time() {
        let mut leg = transit("2024-03-15T10:00:00+01:00", "2024-03-15T10:20:00+01:00");
        if let Leg::Transit(t) = &mut leg {
            t.departure = Event {
                cancelled: true,
                former_scheduled_when: Some(ts("2024-03-15T10:00:00+01:00")),
                ..Event::default()
            };
        }
        assert_eq!(leg.departure_time(), Some(ts("2024-03-15T10:00:00+01:00")));
    }

    #[test]
    fn journey_serializes_leg_tags() {
        let journey = Journey::new(
            vec![walk("2024-03-15T10:00:00+01:00", "2024-03-15T10:05:00+01:00")],
            None,
        )
        .unwrap();
        let json = serde_json::to_value(&journey).unwrap();
        assert_eq!(json["legs"][0]["type"], "walking");
        assert_eq!(json["legs"][0]["distance"], 200);
    }
}
