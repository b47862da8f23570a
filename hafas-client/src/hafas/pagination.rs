//! Collecting trip search pages until enough journeys are found.
//!
//! Some endpoints ignore the requested result count, so `journeys` keeps
//! asking for the next page until it has the target number. Each round-trip
//! starts at the latest departure seen so far and continues from the
//! previous page's forward cursor.
//!
//! The engine is a small state machine:
//!
//! ```text
//! Fetching --page--> Accumulating --target reached / empty page--> Done
//!     ^                   |
//!     +----- continue ----+
//! ```

use std::future::Future;

use tracing::debug;

use crate::domain::{Journey, JourneyList, Timestamp};

use super::convert::JourneyPage;
use super::error::HafasError;

/// Fetches one page of a trip search.
pub trait PageSource {
    fn fetch(
        &self,
        when: Timestamp,
        cursor: Option<&str>,
    ) -> impl Future<Output = Result<JourneyPage, HafasError>> + Send;
}

enum State {
    Fetching {
        when: Timestamp,
        cursor: Option<String>,
    },
    Accumulating {
        page: JourneyPage,
    },
    Done,
}

/// Journeys collected by one run. Owned by the run and handed back at the end.
struct Accumulator {
    journeys: Vec<Journey>,
    earlier_ref: Option<String>,
    later_ref: Option<String>,
    round_trips: usize,
}

/// Runs a trip search to completion.
///
/// With `target` unset the first page is returned whole. Otherwise pages are
/// collected until `target` journeys are found (extra journeys of the last
/// page are dropped) or a page comes back empty.
pub async fn collect<S: PageSource>(
    source: &S,
    when: Timestamp,
    cursor: Option<String>,
    target: Option<usize>,
) -> Result<JourneyList, HafasError> {
    let mut acc = Accumulator {
        journeys: Vec::new(),
        earlier_ref: None,
        later_ref: None,
        round_trips: 0,
    };
    let mut state = State::Fetching { when, cursor };

    loop {
        state = match state {
            State::Fetching { when, cursor } => {
                let page = source.fetch(when, cursor.as_deref()).await?;
                acc.round_trips += 1;
                if acc.round_trips == 1 {
                    acc.earlier_ref = page.earlier_ref.clone();
                }
                State::Accumulating { page }
            }
            State::Accumulating { page } => accumulate(&mut acc, page, target),
            State::Done => break,
        };
    }

    debug!(
        round_trips = acc.round_trips,
        journeys = acc.journeys.len(),
        "Trip search complete"
    );
    Ok(JourneyList {
        journeys: acc.journeys,
        earlier_ref: acc.earlier_ref,
        later_ref: acc.later_ref,
    })
}

fn accumulate(acc: &mut Accumulator, page: JourneyPage, target: Option<usize>) -> State {
    let Some(target) = target else {
        acc.journeys = page.journeys;
        acc.later_ref = page.later_ref;
        return State::Done;
    };

    if page.journeys.is_empty() {
        debug!(round_trip = acc.round_trips, "Empty page, stopping");
        acc.later_ref = page.later_ref;
        return State::Done;
    }

    let mut latest: Option<Timestamp> = None;
    for journey in page.journeys {
        let departure = journey.departure_time();
        acc.journeys.push(journey);
        if acc.journeys.len() >= target {
            acc.later_ref = page.later_ref;
            return State::Done;
        }
        latest = latest.max(departure);
    }

    debug!(
        round_trip = acc.round_trips,
        collected = acc.journeys.len(),
        target,
        "Fetching another page"
    );
    match latest {
        Some(when) => State::Fetching {
            when,
            cursor: page.later_ref,
        },
        None => {
            acc.later_ref = page.later_ref;
            State::Done
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Event, Leg, WalkingLeg};
    use chrono::{DateTime, Duration};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn t0() -> Timestamp {
        DateTime::parse_from_rfc3339("2024-03-15T10:00:00+01:00").unwrap()
    }

    fn journey(minutes: i64) -> Journey {
        let departure = Event {
            when: Some(t0() + Duration::minutes(minutes)),
            ..Event::default()
        };
        let leg = Leg::Walking(WalkingLeg {
            origin: None,
            destination: None,
            departure,
            arrival: Event::default(),
            distance: None,
        });
        Journey::new(vec![leg], None).unwrap()
    }

    /// Serves canned pages and records every request.
    struct Pages {
        pages: Mutex<VecDeque<JourneyPage>>,
        calls: Mutex<Vec<(Timestamp, Option<String>)>>,
    }

    impl Pages {
        fn new(sizes: &[usize]) -> Self {
            let mut offset = 0;
            let pages = sizes
                .iter()
                .enumerate()
                .map(|(i, &n)| {
                    let journeys = (0..n).map(|k| journey(offset + k as i64 * 10)).collect();
                    offset += 100;
                    JourneyPage {
                        journeys,
                        earlier_ref: Some(format!("B{i}")),
                        later_ref: Some(format!("F{i}")),
                    }
                })
                .collect();
            Self {
                pages: Mutex::new(pages),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(Timestamp, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PageSource for Pages {
        async fn fetch(&self, when: Timestamp, cursor: Option<&str>) -> Result<JourneyPage, HafasError> {
            self.calls
                .lock()
                .unwrap()
                .push((when, cursor.map(str::to_string)));
            Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn stops_once_target_reached() {
        let pages = Pages::new(&[2, 2, 1]);
        let list = collect(&pages, t0(), None, Some(4)).await.unwrap();

        assert_eq!(list.len(), 4);
        assert_eq!(pages.calls().len(), 2);
        assert_eq!(list.earlier_ref.as_deref(), Some("B0"));
        assert_eq!(list.later_ref.as_deref(), Some("F1"));

        let deps: Vec<Timestamp> = list.iter().filter_map(Journey::departure_time).collect();
        assert_eq!(deps.len(), 4);
        assert!(deps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn continues_from_latest_departure() {
        let pages = Pages::new(&[2, 2, 1]);
        collect(&pages, t0(), Some("start".into()), Some(4)).await.unwrap();

        let calls = pages.calls();
        assert_eq!(calls[0], (t0(), Some("start".to_string())));
        assert_eq!(calls[1], (t0() + Duration::minutes(10), Some("F0".to_string())));
    }

    #[tokio::test]
    async fn drops_surplus_journeys() {
        let pages = Pages::new(&[3, 3]);
        let list = collect(&pages, t0(), None, Some(4)).await.unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(pages.calls().len(), 2);
    }

    #[tokio::test]
    async fn empty_first_page_is_one_round_trip() {
        let pages = Pages::new(&[0, 2]);
        let list = collect(&pages, t0(), None, Some(4)).await.unwrap();
        assert!(list.is_empty());
        assert_eq!(pages.calls().len(), 1);
        assert_eq!(list.earlier_ref.as_deref(), Some("B0"));
    }

    #[tokio::test]
    async fn runs_dry_when_pages_run_out() {
        let pages = Pages::new(&[2, 1]);
        let list = collect(&pages, t0(), None, Some(10)).await.unwrap();
        assert_eq!(list.len(), 3);
        // Third request gets an empty page.
        assert_eq!(pages.calls().len(), 3);
    }

    #[tokio::test]
    async fn no_target_returns_first_page() {
        let pages = Pages::new(&[3, 3]);
        let list = collect(&pages, t0(), None, None).await.unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.later_ref.as_deref(), Some("F0"));
        assert_eq!(pages.calls().len(), 1);
    }

    struct Failing;

    impl PageSource for Failing {
        async fn fetch(&self, _: Timestamp, _: Option<&str>) -> Result<JourneyPage, HafasError> {
            Err(HafasError::shape("outConL missing"))
        }
    }

    #[tokio::test]
    async fn errors_propagate() {
        let err = collect(&Failing, t0(), None, Some(2)).await.unwrap_err();
        assert!(matches!(err, HafasError::Shape { .. }));
    }
}
