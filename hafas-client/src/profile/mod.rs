//! Per-deployment configuration and behaviour.
//!
//! A [`Profile`] bundles everything that differs between two deployments of
//! the backend: endpoint, client identity, timezone, product table, which
//! operations exist, and a set of formatting/parsing hooks. The core only
//! talks to profiles through the traits below.

mod cfl;
mod invg;
mod vbb;

use std::fmt;
use std::sync::Arc;

use chrono_tz::Tz;
use serde_json::{Map, Value};

use crate::domain::{Line, Location, Timestamp};
use crate::hafas::envelope::{Crd, Envelope, LocationRef, Rect};
use crate::hafas::options::BoundingBox;
use crate::hafas::time;
use crate::hafas::{HafasError, MicMac, ProductTable};

pub use cfl::cfl;
pub use invg::invg;
pub use vbb::vbb;

/// Names accepted by [`by_name`].
pub const PROFILE_NAMES: &[&str] = &["vbb", "cfl", "invg"];

/// Looks up a built-in profile.
pub fn by_name(name: &str) -> Option<Profile> {
    match name.to_ascii_lowercase().as_str() {
        "vbb" => Some(vbb()),
        "cfl" => Some(cfl()),
        "invg" => Some(invg()),
        _ => None,
    }
}

/// Formats station ids for requests.
pub trait StationFormatter {
    /// # Errors
    ///
    /// Returns a validation error if `id` is not acceptable to the deployment.
    fn format_station(&self, id: &str) -> Result<LocationRef, HafasError> {
        if id.is_empty() {
            return Err(HafasError::validation("station id must be non-empty"));
        }
        Ok(LocationRef::station(id))
    }
}

/// Formats coordinates for requests.
pub trait CoordinateFormatter {
    /// Degrees to integer micro-degrees.
    fn format_coordinate(&self, degrees: f64) -> i64 {
        (degrees * 1_000_000.0).round() as i64
    }

    fn format_rectangle(&self, bbox: &BoundingBox) -> Rect {
        Rect {
            ll_crd: Crd {
                x: self.format_coordinate(bbox.west()),
                y: self.format_coordinate(bbox.south()),
            },
            ur_crd: Crd {
                x: self.format_coordinate(bbox.east()),
                y: self.format_coordinate(bbox.north()),
            },
        }
    }
}

/// Formats request dates and times.
pub trait DateTimeFormatter {
    fn format_date(&self, tz: Tz, when: &Timestamp) -> String {
        time::format_date(tz, when)
    }

    fn format_time(&self, tz: Tz, when: &Timestamp) -> String {
        time::format_time(tz, when)
    }
}

/// Last chance to adjust an envelope before it is sent.
pub trait RequestTransformer {
    fn transform_request(&self, envelope: Envelope) -> Envelope {
        envelope
    }
}

/// Adjusts parsed records.
pub trait ResponseParser {
    fn parse_location(&self, location: Location) -> Location {
        location
    }

    fn parse_line(&self, line: Line) -> Line {
        line
    }
}

/// The full hook set of a profile.
pub trait ProfileHooks:
    StationFormatter
    + CoordinateFormatter
    + DateTimeFormatter
    + RequestTransformer
    + ResponseParser
    + fmt::Debug
    + Send
    + Sync
{
}

impl<T> ProfileHooks for T where
    T: StationFormatter
        + CoordinateFormatter
        + DateTimeFormatter
        + RequestTransformer
        + ResponseParser
        + fmt::Debug
        + Send
        + Sync
{
}

/// Hooks with plain backend behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl StationFormatter for DefaultHooks {}
impl CoordinateFormatter for DefaultHooks {}
impl DateTimeFormatter for DefaultHooks {}
impl RequestTransformer for DefaultHooks {}
impl ResponseParser for DefaultHooks {}

/// Authentication and client description sent with every envelope.
///
/// Opaque to the core: the fields are merged into the top level of the
/// envelope as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientIdentity {
    fields: Map<String, Value>,
}

impl ClientIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Optional operations and request features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub trip: bool,
    pub radar: bool,
    pub refresh_journey: bool,
    pub reachable_from: bool,
    /// Endpoint honours `numF` (result count) in trip searches.
    pub journeys_num_f: bool,
    /// Endpoint understands walking speed filters.
    pub journeys_walking_speed: bool,
    /// Endpoint understands barrier-free `META` filters.
    pub accessibility_filters: bool,
}

/// Configuration and hooks for one backend deployment.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub endpoint: String,
    /// Locale tag, e.g. `de-DE`
    pub locale: String,
    /// Envelope `lang`
    pub language: String,
    pub timezone: Tz,
    pub identity: ClientIdentity,
    pub products: ProductTable,
    pub features: Features,
    /// Request checksum, for deployments that require one
    pub signing: Option<MicMac>,
    hooks: Arc<dyn ProfileHooks>,
}

impl Profile {
    /// Creates a profile with default hooks and no optional features.
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        timezone: Tz,
        products: ProductTable,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            locale: "de-DE".to_string(),
            language: "de".to_string(),
            timezone,
            identity: ClientIdentity::default(),
            products,
            features: Features::default(),
            signing: None,
            hooks: Arc::new(DefaultHooks),
        }
    }

    /// Point the profile at another endpoint (for testing).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_identity(mut self, identity: ClientIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    /// Sign every request body with `mic`/`mac` using `salt`.
    pub fn with_mic_mac(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.signing = Some(MicMac::new(salt));
        self
    }

    pub fn with_hooks(mut self, hooks: impl ProfileHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn hooks(&self) -> &dyn ProfileHooks {
        self.hooks.as_ref()
    }
}
