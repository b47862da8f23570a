//! Provider-agnostic transit data model.
//!
//! Every record the client returns is built from these types. They are
//! created fresh for each response and never mutated afterwards. Objects
//! that several records of one response point at (locations, lines,
//! remarks, polylines) are shared through `Arc` rather than cloned.

mod error;
mod event;
mod journey;
mod line;
mod location;
mod movement;
mod remark;
mod stopover;

pub use error::DomainError;
pub use event::Event;
pub use journey::{Journey, JourneyList, Leg, TransitLeg, WalkingLeg};
pub use line::{Line, Mode, Operator, ProductFlags};
pub(crate) use line::slug;
pub use location::{
    Address, Coordinate, Location, NearbyLocation, Poi, Polyline, ReachableGroup, Station, Stop,
};
pub use movement::{Frame, Movement};
pub use remark::{Hint, Icon, Remark, Warning};
pub use stopover::{Arrival, Departure, StationBoardEntry, Stopover};

/// Absolute time with the offset of the profile's timezone.
pub type Timestamp = chrono::DateTime<chrono::FixedOffset>;
