//! Reconciled scheduled/realtime event.
//!
//! An `Event` is one arrival or departure at a stop after the backend's
//! scheduled and realtime fields have been merged. The merge rules live in
//! [`crate::hafas::time`]; this type only carries the result.

use chrono::Duration;
use serde::Serialize;

use super::Timestamp;

/// A single arrival or departure with realtime information applied.
///
/// # Field Semantics
///
/// - `when`: realtime time if known, else scheduled; `None` when cancelled
/// - `delay`: seconds, `None` when unknown (never defaulted to zero)
/// - `platform`: realtime platform if known, else scheduled
/// - `former_scheduled_platform`: scheduled platform, only when it differs
///   from a known realtime platform
/// - `former_scheduled_when`: scheduled time, only when cancelled
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub when: Option<Timestamp>,
    pub delay: Option<i64>,
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub former_scheduled_platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub former_scheduled_when: Option<Timestamp>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

impl Event {
    /// Returns the scheduled time, if it can be recovered.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::DateTime;
    /// use hafas_client::domain::Event;
    ///
    /// let when = DateTime::parse_from_rfc3339("2024-03-15T10:05:00+01:00").unwrap();
    /// let event = Event {
    ///     when: Some(when),
    ///     delay: Some(300),
    ///     ..Event::default()
    /// };
    /// assert_eq!(
    ///     event.scheduled_when().unwrap().to_rfc3339(),
    ///     "2024-03-15T10:00:00+01:00"
    /// );
    /// ```
    pub fn scheduled_when(&self) -> Option<Timestamp> {
        if let Some(former) = self.former_scheduled_when {
            return Some(former);
        }
        let when = self.when?;
        match self.delay {
            Some(delay) => when.checked_sub_signed(Duration::seconds(delay)),
            None => Some(when),
        }
    }

    /// Best known time: `when`, or the scheduled time of a cancelled event.
    pub fn best_when(&self) -> Option<Timestamp> {
        self.when.or(self.former_scheduled_when)
    }

    /// Returns true if the event runs later than scheduled.
    pub fn is_delayed(&self) -> bool {
        self.delay.is_some_and(|d| d > 0)
    }

    /// Returns true if the backend reported nothing for this event.
    pub fn is_empty(&self) -> bool {
        self.when.is_none() && self.former_scheduled_when.is_none() && !self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn ts(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn default_is_empty() {
        let event = Event::default();
        assert!(event.is_empty());
        assert!(!event.is_delayed());
        assert!(event.scheduled_when().is_none());
    }

    #[test]
    fn scheduled_when_prefers_former_scheduled() {
        let event = Event {
            cancelled: true,
            former_scheduled_when: Some(ts("2024-03-15T10:00:00+01:00")),
            ..Event::default()
        };
        assert_eq!(event.scheduled_when(), Some(ts("2024-03-15T10:00:00+01:00")));
        assert_eq!(event.best_when(), Some(ts("2024-03-15T10:00:00+01:00")));
        assert!(!event.is_empty());
    }

    #[test]
    fn early_is_not_delayed() {
        let event = Event {
            when: Some(ts("2024-03-15T09:59:00+01:00")),
            delay: Some(-60),
            ..Event::default()
        };
        assert!(!event.is_delayed());
        assert_eq!(event.scheduled_when(), Some(ts("2024-03-15T10:00:00+01:00")));
    }

    #[test]
    fn serialization_skips_absent_fields() {
        let event = Event {
            when: Some(ts("2024-03-15T10:00:00+01:00")),
            ..Event::default()
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("cancelled").is_none());
        assert!(json.get("formerScheduledWhen").is_none());
        assert!(json["delay"].is_null());
    }
}
