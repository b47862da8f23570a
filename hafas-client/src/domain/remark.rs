//! Hints and warnings attached to departures, stopovers and journeys.

use std::sync::Arc;

use serde::Serialize;

use super::Timestamp;

/// An icon shared by remarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Icon {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fg_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
}

/// Informational remark, e.g. "bicycles allowed".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub code: Option<String>,
    pub text: Option<String>,
    /// Backend remark class (`A`, `I`, `R`, ...).
    pub hint_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Arc<Icon>>,
}

/// Service disruption message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub text: Option<String>,
    pub priority: Option<i64>,
    pub category: Option<i64>,
    pub valid_from: Option<Timestamp>,
    pub valid_until: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Arc<Icon>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Remark {
    Hint(Hint),
    Warning(Warning),
}

impl Remark {
    pub fn text(&self) -> Option<&str> {
        match self {
            Remark::Hint(h) => h.text.as_deref(),
            Remark::Warning(w) => w.text.as_deref(),
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Remark::Warning(_))
    }
}
