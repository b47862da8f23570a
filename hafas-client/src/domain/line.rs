//! Lines, operators and transport modes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Product flags keyed by a profile's product id (e.g. `"bus"`).
pub type ProductFlags = BTreeMap<String, bool>;

/// FPTF transport mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Train,
    Bus,
    Watercraft,
    Taxi,
    Gondola,
    Aircraft,
    Car,
    Bicycle,
    Walking,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Train => "train",
            Mode::Bus => "bus",
            Mode::Watercraft => "watercraft",
            Mode::Taxi => "taxi",
            Mode::Gondola => "gondola",
            Mode::Aircraft => "aircraft",
            Mode::Car => "car",
            Mode::Bicycle => "bicycle",
            Mode::Walking => "walking",
        };
        f.write_str(s)
    }
}

/// A transport operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operator {
    /// Slug derived from the name, e.g. `"berliner-verkehrsbetriebe"`.
    pub id: String,
    pub name: String,
}

impl Operator {
    /// Creates an operator, deriving its id from the name.
    ///
    /// # Examples
    ///
    /// ```
    /// use hafas_client::domain::Operator;
    ///
    /// let op = Operator::new("S-Bahn Berlin GmbH");
    /// assert_eq!(op.id, "s-bahn-berlin-gmbh");
    /// ```
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: slug(&name),
            name,
        }
    }
}

pub(crate) fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    out
}

/// A scheduled service, shared by every record of a response that uses it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub mode: Option<Mode>,
    /// Product id from the profile's product table.
    pub product: Option<String>,
    /// Raw product class bitmask as returned by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fahrt_nr: Option<String>,
    pub public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<Arc<Operator>>,
}

impl Line {
    /// Creates a public line with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            mode: None,
            product: None,
            class: None,
            fahrt_nr: None,
            public: true,
            operator: None,
        }
    }
}
