//! Backend date/time tokens and realtime reconciliation.
//!
//! The backend encodes dates as `YYYYMMDD` and times as `HHMMSS`, or as
//! `DDHHMMSS` where `DD` is a day offset from the service date (a train
//! leaving at 00:15 on the night after its service day is `01001500`).
//! Both are local times in the profile's timezone.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::domain::{Event, Timestamp};

/// Error parsing a backend date or time token.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeError {
    #[error("invalid date token: {0:?}")]
    InvalidDate(String),

    #[error("invalid time token: {0:?}")]
    InvalidTime(String),

    /// Local time falls into a DST gap
    #[error("local time {local} does not exist in {timezone}")]
    Nonexistent { local: String, timezone: String },
}

/// Parses a `YYYYMMDD` date token.
pub fn parse_date(token: &str) -> Result<NaiveDate, TimeError> {
    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeError::InvalidDate(token.to_string()));
    }
    NaiveDate::parse_from_str(token, "%Y%m%d").map_err(|_| TimeError::InvalidDate(token.to_string()))
}

/// Splits a time token into a day offset and a time of day.
fn parse_time(token: &str) -> Result<(i64, NaiveTime), TimeError> {
    let invalid = || TimeError::InvalidTime(token.to_string());
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let (days, clock) = match token.len() {
        6 => (0, token),
        8 => (token[..2].parse::<i64>().map_err(|_| invalid())?, &token[2..]),
        _ => return Err(invalid()),
    };
    let h = clock[0..2].parse::<u32>().map_err(|_| invalid())?;
    let m = clock[2..4].parse::<u32>().map_err(|_| invalid())?;
    let s = clock[4..6].parse::<u32>().map_err(|_| invalid())?;
    let time = NaiveTime::from_hms_opt(h, m, s).ok_or_else(invalid)?;
    Ok((days, time))
}

/// Combines a date token and a time token into an absolute timestamp.
///
/// Ambiguous local times (the repeated hour when clocks go back) resolve to
/// the earlier instant.
///
/// # Examples
///
/// ```
/// use hafas_client::hafas::time::parse_date_time;
///
/// let tz = chrono_tz::Europe::Berlin;
/// let t = parse_date_time(tz, "20240315", "101500").unwrap();
/// assert_eq!(t.to_rfc3339(), "2024-03-15T10:15:00+01:00");
///
/// // Day offset: 00:15 on the following day
/// let t = parse_date_time(tz, "20240315", "01001500").unwrap();
/// assert_eq!(t.to_rfc3339(), "2024-03-16T00:15:00+01:00");
/// ```
pub fn parse_date_time(tz: Tz, date: &str, time: &str) -> Result<Timestamp, TimeError> {
    let date = parse_date(date)?;
    let (days, clock) = parse_time(time)?;
    let local = date.and_time(clock) + Duration::days(days);

    match tz.from_local_datetime(&local) {
        LocalResult::Single(t) => Ok(t.fixed_offset()),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.fixed_offset()),
        LocalResult::None => Err(TimeError::Nonexistent {
            local: local.to_string(),
            timezone: tz.name().to_string(),
        }),
    }
}

/// Formats the date part of `when` as `YYYYMMDD` in `tz`.
pub fn format_date<Z: TimeZone>(tz: Tz, when: &DateTime<Z>) -> String {
    when.with_timezone(&tz).format("%Y%m%d").to_string()
}

/// Formats the time part of `when` as `HHMMSS` in `tz`.
pub fn format_time<Z: TimeZone>(tz: Tz, when: &DateTime<Z>) -> String {
    when.with_timezone(&tz).format("%H%M%S").to_string()
}

/// Delay in whole seconds, rounded to nearest.
pub fn delay_seconds(scheduled: Timestamp, realtime: Timestamp) -> i64 {
    let ms = realtime.signed_duration_since(scheduled).num_milliseconds();
    (ms as f64 / 1000.0).round() as i64
}

/// Raw scheduled/realtime fields of one arrival or departure.
///
/// Empty strings count as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawEvent<'a> {
    pub scheduled: Option<&'a str>,
    pub realtime: Option<&'a str>,
    pub scheduled_platform: Option<&'a str>,
    pub realtime_platform: Option<&'a str>,
    pub cancelled: bool,
}

fn present(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Reconciles scheduled and realtime fields into an [`Event`].
///
/// Cancellation is applied last: it clears `when` and `delay` and keeps the
/// scheduled time as `former_scheduled_when`.
///
/// # Examples
///
/// ```
/// use hafas_client::hafas::time::{RawEvent, reconcile};
///
/// let tz = chrono_tz::Europe::Berlin;
/// let event = reconcile(tz, "20240315", RawEvent {
///     scheduled: Some("101500"),
///     realtime: Some("101730"),
///     scheduled_platform: Some("1"),
///     realtime_platform: Some("3"),
///     cancelled: false,
/// }).unwrap();
///
/// assert_eq!(event.delay, Some(150));
/// assert_eq!(event.platform.as_deref(), Some("3"));
/// assert_eq!(event.former_scheduled_platform.as_deref(), Some("1"));
/// ```
pub fn reconcile(tz: Tz, date: &str, raw: RawEvent<'_>) -> Result<Event, TimeError> {
    let scheduled = present(raw.scheduled)
        .map(|t| parse_date_time(tz, date, t))
        .transpose()?;
    let realtime = present(raw.realtime)
        .map(|t| parse_date_time(tz, date, t))
        .transpose()?;

    let delay = match (scheduled, realtime) {
        (Some(s), Some(r)) => Some(delay_seconds(s, r)),
        _ => None,
    };

    let scheduled_platform = present(raw.scheduled_platform);
    let realtime_platform = present(raw.realtime_platform);
    let former_scheduled_platform = match (scheduled_platform, realtime_platform) {
        (Some(s), Some(r)) if s != r => Some(s.to_string()),
        _ => None,
    };

    let mut event = Event {
        when: realtime.or(scheduled),
        delay,
        platform: realtime_platform.or(scheduled_platform).map(str::to_string),
        former_scheduled_platform,
        former_scheduled_when: None,
        cancelled: false,
    };

    if raw.cancelled {
        event.cancelled = true;
        event.when = None;
        event.delay = None;
        event.former_scheduled_when = scheduled;
    }

    Ok(event)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono_tz::Europe::Berlin;
    use proptest::prelude::*;

    fn token(secs: u32) -> String {
        let days = secs / 86_400;
        let rest = secs % 86_400;
        format!(
            "{:02}{:02}{:02}{:02}",
            days,
            rest / 3600,
            (rest % 3600) / 60,
            rest % 60
        )
    }

    proptest! {
        /// delay = realtime - scheduled, in seconds
        #[test]
        fn delay_matches_difference(
            scheduled in 0u32..172_800,
            shift in -7_200i64..7_200,
        ) {
            let realtime = (scheduled as i64 + shift).max(0) as u32;
            // 2024-01-10 has no DST transition within two days
            let event = reconcile(Berlin, "20240110", RawEvent {
                scheduled: Some(token(scheduled).as_str()),
                realtime: Some(token(realtime).as_str()),
                ..RawEvent::default()
            }).unwrap();

            prop_assert_eq!(event.delay, Some(realtime as i64 - scheduled as i64));
        }

        /// Missing realtime always means unknown delay
        #[test]
        fn delay_unknown_without_both(scheduled in 0u32..86_400, with_scheduled in any::<bool>()) {
            let s = token(scheduled);
            let raw = if with_scheduled {
                RawEvent { scheduled: Some(s.as_str()), ..RawEvent::default() }
            } else {
                RawEvent { realtime: Some(s.as_str()), ..RawEvent::default() }
            };
            let event = reconcile(Berlin, "20240110", raw).unwrap();
            prop_assert_eq!(event.delay, None);
        }

        /// Cancellation clears when/delay and keeps the schedule
        #[test]
        fn cancellation_preserves_schedule(
            scheduled in 0u32..86_400,
            realtime in proptest::option::of(0u32..86_400),
        ) {
            let s = token(scheduled);
            let r = realtime.map(token);
            let event = reconcile(Berlin, "20240110", RawEvent {
                scheduled: Some(s.as_str()),
                realtime: r.as_deref(),
                cancelled: true,
                ..RawEvent::default()
            }).unwrap();

            let expected = parse_date_time(Berlin, "20240110", &s).unwrap();
            prop_assert!(event.cancelled);
            prop_assert_eq!(event.when, None);
            prop_assert_eq!(event.delay, None);
            prop_assert_eq!(event.former_scheduled_when, Some(expected));
        }

        /// Rounding to the nearest second
        #[test]
        fn delay_seconds_rounds(base in 0i64..1_000_000, ms in -100_000i64..100_000) {
            let s = DateTime::from_timestamp(base, 0).unwrap().fixed_offset();
            let r = s + Duration::milliseconds(ms);
            prop_assert_eq!(delay_seconds(s, r), (ms as f64 / 1000.0).round() as i64);
        }
    }
}
