//! Conversion from backend results to domain types.
//!
//! Each function takes one decoded `res` object, resolves its `common`
//! block and builds the domain records. Missing required fields are shape
//! errors; lists the backend simply omits when empty (station boards,
//! location matches, trip search pages, radar) convert to empty lists.

use std::sync::Arc;

use chrono::Duration;
use serde_json::Value;

use crate::domain::{
    Frame, Journey, Leg, Location, Movement, NearbyLocation, ReachableGroup, Remark,
    StationBoardEntry, Stopover, Timestamp, TransitLeg, WalkingLeg,
};
use crate::profile::Profile;

use super::envelope::BoardType;
use super::error::HafasError;
use super::resolve::{ResolveOptions, Shared, parse_coordinate};
use super::time::{RawEvent, reconcile};
use super::types::{
    RawConnection, RawJourney, RawJourneyDetailsResult, RawJourneyListResult,
    RawLocMatchResult, RawLocationListResult, RawReachResult, RawSection, RawStop,
    RawTripSearchResult,
};

fn arrival_fields(stop: &RawStop) -> RawEvent<'_> {
    RawEvent {
        scheduled: stop.a_time_s.as_deref(),
        realtime: stop.a_time_r.as_deref(),
        scheduled_platform: stop.a_platf_s.as_deref(),
        realtime_platform: stop.a_platf_r.as_deref(),
        cancelled: stop.a_cncl.unwrap_or(false),
    }
}

fn departure_fields(stop: &RawStop) -> RawEvent<'_> {
    RawEvent {
        scheduled: stop.d_time_s.as_deref(),
        realtime: stop.d_time_r.as_deref(),
        scheduled_platform: stop.d_platf_s.as_deref(),
        realtime_platform: stop.d_platf_r.as_deref(),
        cancelled: stop.d_cncl.unwrap_or(false),
    }
}

fn required<'a, T>(value: &'a Option<T>, field: &str) -> Result<&'a T, HafasError> {
    value
        .as_ref()
        .ok_or_else(|| HafasError::shape(format!("{field} missing")))
}

fn journey_remarks(shared: &Shared, jny: &RawJourney) -> Vec<Arc<Remark>> {
    shared.remarks(jny.rem_l.iter().chain(&jny.msg_l))
}

/// Converts one stop of a trip.
pub fn stopover(
    profile: &Profile,
    shared: &Shared,
    date: &str,
    raw: &RawStop,
) -> Result<Stopover, HafasError> {
    let arrival = reconcile(profile.timezone, date, arrival_fields(raw))?;
    let departure = reconcile(profile.timezone, date, departure_fields(raw))?;
    Ok(Stopover {
        stop: shared.location(raw.loc_x),
        cancelled: arrival.cancelled || departure.cancelled,
        arrival,
        departure,
        pass_by: raw.d_in_s == Some(false) && raw.a_out_s == Some(false),
        remarks: shared.remarks(&raw.msg_l),
    })
}

/// Converts the stops of a trip, leaving out those passed without stopping.
pub fn stopovers(
    profile: &Profile,
    shared: &Shared,
    date: &str,
    stops: &[RawStop],
) -> Result<Vec<Stopover>, HafasError> {
    let mut out = Vec::with_capacity(stops.len());
    for raw in stops {
        let st = stopover(profile, shared, date, raw)?;
        if !st.pass_by {
            out.push(st);
        }
    }
    Ok(out)
}

/// Converts a `StationBoard` result, sorted by time.
pub fn station_board(
    profile: &Profile,
    res: &RawJourneyListResult,
    kind: BoardType,
    options: ResolveOptions,
    with_stopovers: bool,
) -> Result<Vec<StationBoardEntry>, HafasError> {
    let shared = Shared::resolve(profile, &res.common, options);
    let journeys = res.jny_l.as_deref().unwrap_or_default();

    let mut entries = Vec::with_capacity(journeys.len());
    for (i, jny) in journeys.iter().enumerate() {
        let trip_id = required(&jny.jid, &format!("jnyL[{i}].jid"))?;
        let date = required(&jny.date, &format!("jnyL[{i}].date"))?;
        let stb = required(&jny.stb_stop, &format!("jnyL[{i}].stbStop"))?;

        let fields = match kind {
            BoardType::Departures => departure_fields(stb),
            BoardType::Arrivals => arrival_fields(stb),
        };
        let stops = match (&jny.stop_l, with_stopovers) {
            (Some(stops), true) => Some(stopovers(profile, &shared, date, stops)?),
            _ => None,
        };

        entries.push(StationBoardEntry {
            trip_id: trip_id.clone(),
            stop: shared.location(stb.loc_x),
            line: shared.line(jny.prod_x),
            direction: match kind {
                BoardType::Departures => jny.dir_txt.clone(),
                BoardType::Arrivals => None,
            },
            event: reconcile(profile.timezone, date, fields)?,
            remarks: journey_remarks(&shared, jny),
            stopovers: stops,
        });
    }

    entries.sort_by_key(|e| e.event.best_when());
    Ok(entries)
}

fn transit_leg(
    profile: &Profile,
    shared: &Shared,
    date: &str,
    jny: &RawJourney,
    dep: &RawStop,
    arr: &RawStop,
    with_stopovers: bool,
) -> Result<TransitLeg, HafasError> {
    let trip_id = required(&jny.jid, "jny.jid")?;
    let stops = match (&jny.stop_l, with_stopovers) {
        (Some(stops), true) => Some(stopovers(profile, shared, date, stops)?),
        _ => None,
    };
    let polyline = jny
        .poly_g
        .as_ref()
        .and_then(|g| g.poly_x_l.first().copied())
        .and_then(|i| shared.polyline(Some(i)));

    Ok(TransitLeg {
        trip_id: trip_id.clone(),
        line: shared.line(jny.prod_x),
        direction: jny.dir_txt.clone(),
        origin: shared.location(dep.loc_x),
        destination: shared.location(arr.loc_x),
        departure: reconcile(profile.timezone, date, departure_fields(dep))?,
        arrival: reconcile(profile.timezone, date, arrival_fields(arr))?,
        stopovers: stops,
        polyline,
        remarks: journey_remarks(shared, jny),
    })
}

fn leg(
    profile: &Profile,
    shared: &Shared,
    date: &str,
    section: &RawSection,
    with_stopovers: bool,
) -> Result<Leg, HafasError> {
    if section.kind == "JNY" {
        let jny = required(&section.jny, "secL[].jny")?;
        let leg = transit_leg(
            profile,
            shared,
            date,
            jny,
            &section.dep,
            &section.arr,
            with_stopovers,
        )?;
        return Ok(Leg::Transit(leg));
    }
    Ok(Leg::Walking(WalkingLeg {
        origin: shared.location(section.dep.loc_x),
        destination: shared.location(section.arr.loc_x),
        departure: reconcile(profile.timezone, date, departure_fields(&section.dep))?,
        arrival: reconcile(profile.timezone, date, arrival_fields(&section.arr))?,
        distance: section.gis.as_ref().and_then(|g| g.dist),
    }))
}

fn journey(
    profile: &Profile,
    shared: &Shared,
    con: &RawConnection,
    with_stopovers: bool,
) -> Result<Journey, HafasError> {
    let legs = con
        .sec_l
        .iter()
        .map(|s| leg(profile, shared, &con.date, s, with_stopovers))
        .collect::<Result<Vec<_>, _>>()?;
    Journey::new(legs, con.ctx_recon.clone()).map_err(|e| HafasError::shape(e.to_string()))
}

/// One page of a trip search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JourneyPage {
    pub journeys: Vec<Journey>,
    /// `outCtxScrB`
    pub earlier_ref: Option<String>,
    /// `outCtxScrF`
    pub later_ref: Option<String>,
}

/// Converts a `TripSearch` result.
pub fn journey_page(
    profile: &Profile,
    res: &RawTripSearchResult,
    options: ResolveOptions,
    with_stopovers: bool,
) -> Result<JourneyPage, HafasError> {
    let shared = Shared::resolve(profile, &res.common, options);
    let journeys = res
        .out_con_l
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|con| journey(profile, &shared, con, with_stopovers))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(JourneyPage {
        journeys,
        earlier_ref: res.out_ctx_scr_b.clone(),
        later_ref: res.out_ctx_scr_f.clone(),
    })
}

/// Converts a `Reconstruction` result; the journey must be present.
pub fn refreshed_journey(
    profile: &Profile,
    res: &RawTripSearchResult,
    options: ResolveOptions,
    with_stopovers: bool,
) -> Result<Journey, HafasError> {
    let shared = Shared::resolve(profile, &res.common, options);
    let con = res
        .out_con_l
        .as_ref()
        .and_then(|l| l.first())
        .ok_or_else(|| HafasError::shape("outConL[0] missing"))?;
    journey(profile, &shared, con, with_stopovers)
}

/// Converts a `JourneyDetails` result into a single leg spanning the
/// first to the last stop.
pub fn trip(
    profile: &Profile,
    res: &RawJourneyDetailsResult,
    options: ResolveOptions,
    with_stopovers: bool,
) -> Result<TransitLeg, HafasError> {
    let shared = Shared::resolve(profile, &res.common, options);
    let jny = required(&res.journey, "journey")?;
    let date = required(&jny.date, "journey.date")?;
    let stops = required(&jny.stop_l, "journey.stopL")?;
    let dep = stops
        .iter()
        .min_by_key(|s| s.idx)
        .ok_or_else(|| HafasError::shape("journey.stopL is empty"))?;
    let arr = stops
        .iter()
        .max_by_key(|s| s.idx)
        .ok_or_else(|| HafasError::shape("journey.stopL is empty"))?;
    transit_leg(profile, &shared, date, jny, dep, arr, with_stopovers)
}

fn resolve_list(profile: &Profile, res: &RawLocationListResult, options: ResolveOptions) -> Vec<Option<Arc<Location>>> {
    let shared = Shared::resolve(profile, &res.common, options);
    shared.parse_locations(profile, res.loc_l.as_deref().unwrap_or_default())
}

/// Converts a `LocMatch` result, skipping unparsable entries.
pub fn locations(
    profile: &Profile,
    res: &RawLocMatchResult,
    options: ResolveOptions,
) -> Vec<Arc<Location>> {
    let Some(matched) = &res.r#match else {
        return Vec::new();
    };
    let shared = Shared::resolve(profile, &res.common, options);
    shared
        .parse_locations(profile, matched.loc_l.as_deref().unwrap_or_default())
        .into_iter()
        .flatten()
        .collect()
}

/// Converts a `LocDetails` result; the first location must be present.
pub fn station(
    profile: &Profile,
    res: &RawLocationListResult,
    options: ResolveOptions,
) -> Result<Arc<Location>, HafasError> {
    if res.loc_l.as_ref().is_none_or(|l| l.is_empty()) {
        return Err(HafasError::shape("locL[0] missing"));
    }
    resolve_list(profile, res, options)
        .into_iter()
        .next()
        .flatten()
        .ok_or_else(|| HafasError::shape("locL[0] is not a location"))
}

/// Converts a `LocGeoPos` result.
pub fn nearby(
    profile: &Profile,
    res: &RawLocationListResult,
    options: ResolveOptions,
) -> Vec<NearbyLocation> {
    let raw = res.loc_l.as_deref().unwrap_or_default();
    resolve_list(profile, res, options)
        .into_iter()
        .zip(raw)
        .filter_map(|(location, value)| {
            Some(NearbyLocation {
                location: location?,
                distance: value
                    .get("dist")
                    .and_then(Value::as_u64)
                    .and_then(|d| u32::try_from(d).ok()),
            })
        })
        .collect()
}

fn movement(
    profile: &Profile,
    shared: &Shared,
    jny: &RawJourney,
    when: Timestamp,
) -> Result<Movement, HafasError> {
    let trip_id = required(&jny.jid, "jnyL[].jid")?;
    let next_stopovers = match (&jny.stop_l, &jny.date) {
        (Some(stops), Some(date)) => stopovers(profile, shared, date, stops)?,
        _ => Vec::new(),
    };

    let mut frames = Vec::new();
    let mut poly_g = jny.poly_g.as_ref();
    if let Some(ani) = &jny.ani {
        for (i, ms) in ani.m_sec.iter().enumerate() {
            let Some(t) = when.checked_add_signed(Duration::milliseconds(*ms)) else {
                continue;
            };
            let origin = shared.location(ani.f_loc_x.get(i).copied());
            let destination = shared.location(ani.t_loc_x.get(i).copied());
            let progress = ani.proc.get(i).map(|p| p / 100.0);
            let coordinate = match (&origin, &destination, progress) {
                (Some(o), Some(d), Some(p)) => o
                    .coordinate()
                    .zip(d.coordinate())
                    .map(|(a, b)| a.interpolate(&b, p)),
                _ => None,
            };
            frames.push(Frame {
                origin,
                destination,
                t,
                progress,
                coordinate,
            });
        }
        poly_g = ani.poly_g.as_ref().or(poly_g);
    }

    Ok(Movement {
        trip_id: trip_id.clone(),
        direction: jny.dir_txt.clone(),
        line: shared.line(jny.prod_x),
        location: jny.pos.and_then(parse_coordinate),
        next_stopovers,
        frames,
        polyline: poly_g
            .and_then(|g| g.poly_x_l.first().copied())
            .and_then(|i| shared.polyline(Some(i))),
    })
}

/// Converts a `JourneyGeoPos` result. Frame times are offsets from `when`.
pub fn movements(
    profile: &Profile,
    res: &RawJourneyListResult,
    options: ResolveOptions,
    when: Timestamp,
) -> Result<Vec<Movement>, HafasError> {
    let shared = Shared::resolve(profile, &res.common, options);
    res.jny_l
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|jny| movement(profile, &shared, jny, when))
        .collect()
}

/// Converts a `LocGeoReach` result into groups of equal travel duration,
/// shortest first.
///
/// A missing `posL` is a shape error, which the caller may retry.
pub fn reachable(profile: &Profile, res: &RawReachResult) -> Result<Vec<ReachableGroup>, HafasError> {
    let positions = res
        .pos_l
        .as_ref()
        .ok_or_else(|| HafasError::shape("posL missing"))?;
    let shared = Shared::resolve(profile, &res.common, ResolveOptions::default());

    let mut sorted: Vec<_> = positions.iter().collect();
    sorted.sort_by_key(|p| p.dur);

    let mut groups: Vec<ReachableGroup> = Vec::new();
    for pos in sorted {
        let Some(location) = shared.location(Some(pos.loc_x)) else {
            continue;
        };
        match groups.last_mut() {
            Some(group) if group.duration == pos.dur => group.stations.push(location),
            _ => groups.push(ReachableGroup {
                duration: pos.dur,
                stations: vec![location],
            }),
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::vbb;
    use chrono::DateTime;
    use serde_json::json;

    fn t(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn all() -> ResolveOptions {
        ResolveOptions {
            remarks: true,
            polylines: true,
            station_lines: false,
        }
    }

    fn common() -> Value {
        json!({
            "locL": [
                {"lid": "A=1@L=900100003@", "type": "S", "name": "Alexanderplatz", "extId": "900100003",
                 "crd": {"x": 13411000, "y": 52521000}},
                {"lid": "A=1@L=900100001@", "type": "S", "name": "Friedrichstr.", "extId": "900100001",
                 "crd": {"x": 13387000, "y": 52520000}},
                {"lid": "A=1@L=900100002@", "type": "S", "name": "Hackescher Markt", "extId": "900100002",
                 "crd": {"x": 13402000, "y": 52522000}}
            ],
            "prodL": [{"name": "S5", "cls": 1}],
            "remL": [{"type": "A", "code": "FB", "txtN": "Bicycles allowed"}],
            "polyL": [{"crdEncYX": "_p~iF~ps|U_ulLnnqC_mqNvxq`@"}]
        })
    }

    #[test]
    fn departures_sorted_and_reconciled() {
        let res: RawJourneyListResult = serde_json::from_value(json!({
            "common": common(),
            "jnyL": [
                {"jid": "1|2", "date": "20240315", "prodX": 0, "dirTxt": "Spandau",
                 "stbStop": {"locX": 0, "dTimeS": "101000", "dTimeR": "101200", "dPlatfS": "1", "dPlatfR": "2"},
                 "msgL": [{"type": "REM", "remX": 0}, {"type": "REM"}]},
                {"jid": "1|3", "date": "20240315", "prodX": 0, "dirTxt": "Ostkreuz",
                 "stbStop": {"locX": 0, "dTimeS": "100500", "dCncl": true}}
            ]
        }))
        .unwrap();

        let deps = station_board(&vbb(), &res, BoardType::Departures, all(), false).unwrap();
        assert_eq!(deps.len(), 2);
        // The cancelled one keeps its slot by scheduled time.
        assert_eq!(deps[0].trip_id, "1|3");
        assert!(deps[0].event.cancelled);
        assert_eq!(deps[0].event.when, None);
        assert_eq!(
            deps[0].event.former_scheduled_when,
            Some(t("2024-03-15T10:05:00+01:00"))
        );

        let dep = &deps[1];
        assert_eq!(dep.event.delay, Some(120));
        assert_eq!(dep.event.platform.as_deref(), Some("2"));
        assert_eq!(dep.direction.as_deref(), Some("Spandau"));
        assert_eq!(dep.line.as_ref().unwrap().name.as_deref(), Some("S5"));
        assert_eq!(dep.stop.as_ref().unwrap().id(), Some("900000100003"));
        assert_eq!(dep.remarks.len(), 1);
        assert!(matches!(dep.remarks[0].as_ref(), Remark::Hint(_)));
    }

    #[test]
    fn arrivals_have_no_direction_and_previous_stopovers() {
        let res: RawJourneyListResult = serde_json::from_value(json!({
            "common": common(),
            "jnyL": [{
                "jid": "1|2", "date": "20240315", "prodX": 0, "dirTxt": "Spandau",
                "stbStop": {"locX": 0, "aTimeS": "101000"},
                "stopL": [
                    {"locX": 1, "dTimeS": "100000"},
                    {"locX": 2, "aTimeS": "100500", "dTimeS": "100500", "dInS": false, "aOutS": false},
                    {"locX": 0, "aTimeS": "101000"}
                ]
            }]
        }))
        .unwrap();

        let arrs = station_board(&vbb(), &res, BoardType::Arrivals, all(), true).unwrap();
        assert_eq!(arrs[0].direction, None);
        let stops = arrs[0].stopovers.as_ref().unwrap();
        // Passed without stopping
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[1].arrival.when, Some(t("2024-03-15T10:10:00+01:00")));
    }

    #[test]
    fn board_without_journeys_is_empty() {
        let res: RawJourneyListResult = serde_json::from_value(json!({"common": {}})).unwrap();
        assert!(station_board(&vbb(), &res, BoardType::Departures, all(), false).unwrap().is_empty());
    }

    #[test]
    fn board_entry_without_stop_is_shape_error() {
        let res: RawJourneyListResult = serde_json::from_value(json!({
            "jnyL": [{"jid": "1|2", "date": "20240315"}]
        }))
        .unwrap();
        let err = station_board(&vbb(), &res, BoardType::Departures, all(), false).unwrap_err();
        assert!(err.to_string().contains("jnyL[0].stbStop"));
    }

    fn trip_search() -> RawTripSearchResult {
        serde_json::from_value(json!({
            "common": common(),
            "outConL": [{
                "date": "20240315",
                "ctxRecon": "T$A=1@L=900100003@",
                "secL": [
                    {"type": "JNY",
                     "dep": {"locX": 0, "dTimeS": "100000", "dTimeR": "100100"},
                     "arr": {"locX": 1, "aTimeS": "100800"},
                     "jny": {"jid": "1|2", "prodX": 0, "dirTxt": "Spandau", "polyG": {"polyXL": [0]},
                             "stopL": [{"locX": 0, "dTimeS": "100000"}, {"locX": 1, "aTimeS": "100800"}]}},
                    {"type": "WALK",
                     "dep": {"locX": 1, "dTimeS": "100800"},
                     "arr": {"locX": 2, "aTimeS": "101500"},
                     "gis": {"dist": 420}}
                ]
            }],
            "outCtxScrB": "B",
            "outCtxScrF": "F"
        }))
        .unwrap()
    }

    #[test]
    fn journeys_with_legs() {
        let page = journey_page(&vbb(), &trip_search(), all(), true).unwrap();
        assert_eq!(page.earlier_ref.as_deref(), Some("B"));
        assert_eq!(page.later_ref.as_deref(), Some("F"));

        let j = &page.journeys[0];
        assert_eq!(j.refresh_token(), Some("T$A=1@L=900100003@"));
        assert_eq!(j.legs().len(), 2);
        assert_eq!(j.departure_time(), Some(t("2024-03-15T10:01:00+01:00")));

        let Leg::Transit(ride) = &j.legs()[0] else {
            panic!("expected a transit leg");
        };
        assert_eq!(ride.departure.delay, Some(60));
        assert_eq!(ride.stopovers.as_ref().unwrap().len(), 2);
        assert_eq!(ride.polyline.as_ref().unwrap().points.len(), 3);

        let Leg::Walking(walk) = &j.legs()[1] else {
            panic!("expected a walking leg");
        };
        assert_eq!(walk.distance, Some(420));
        assert!(walk.origin.is_some());
    }

    #[test]
    fn refresh_requires_connection() {
        let empty: RawTripSearchResult = serde_json::from_value(json!({"outConL": []})).unwrap();
        let err = refreshed_journey(&vbb(), &empty, all(), false).unwrap_err();
        assert!(err.to_string().contains("outConL[0]"));

        let j = refreshed_journey(&vbb(), &trip_search(), all(), false).unwrap();
        let Leg::Transit(ride) = j.first_leg() else {
            panic!("expected a transit leg");
        };
        assert!(ride.stopovers.is_none());
    }

    #[test]
    fn connection_without_sections_is_shape_error() {
        let res: RawTripSearchResult = serde_json::from_value(json!({
            "outConL": [{"date": "20240315", "secL": []}]
        }))
        .unwrap();
        assert!(matches!(
            journey_page(&vbb(), &res, all(), false),
            Err(HafasError::Shape { .. })
        ));
    }

    #[test]
    fn trip_spans_first_to_last_stop() {
        let res: RawJourneyDetailsResult = serde_json::from_value(json!({
            "common": common(),
            "journey": {
                "jid": "1|2", "date": "20240315", "prodX": 0,
                "stopL": [
                    {"locX": 2, "idx": 2, "aTimeS": "101500"},
                    {"locX": 0, "idx": 0, "dTimeS": "100000"},
                    {"locX": 1, "idx": 1, "aTimeS": "100800", "dTimeS": "100900"}
                ]
            }
        }))
        .unwrap();
        let leg = trip(&vbb(), &res, all(), true).unwrap();
        assert_eq!(leg.origin.as_ref().unwrap().name(), "Alexanderplatz");
        assert_eq!(leg.destination.as_ref().unwrap().name(), "Hackescher Markt");
        assert_eq!(leg.departure.when, Some(t("2024-03-15T10:00:00+01:00")));
        assert_eq!(leg.arrival.when, Some(t("2024-03-15T10:15:00+01:00")));
        assert_eq!(leg.stopovers.as_ref().unwrap().len(), 3);

        let missing: RawJourneyDetailsResult = serde_json::from_value(json!({"common": {}})).unwrap();
        assert!(trip(&vbb(), &missing, all(), true).is_err());
    }

    #[test]
    fn station_and_nearby() {
        let res: RawLocationListResult = serde_json::from_value(json!({
            "locL": [
                {"lid": "A=1@L=900100003@", "type": "S", "name": "Alexanderplatz", "extId": "900100003", "dist": 120},
                {"type": "X"}
            ]
        }))
        .unwrap();
        let station_loc = station(&vbb(), &res, all()).unwrap();
        assert_eq!(station_loc.id(), Some("900000100003"));

        let near = nearby(&vbb(), &res, all());
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].distance, Some(120));

        let empty: RawLocationListResult = serde_json::from_value(json!({"locL": []})).unwrap();
        assert!(station(&vbb(), &empty, all()).is_err());
    }

    #[test]
    fn location_matches() {
        let res: RawLocMatchResult = serde_json::from_value(json!({
            "match": {"locL": [
                {"type": "A", "name": "Torfstr. 17", "crd": {"x": 13350042, "y": 52541797}},
                {"type": "P", "name": "No coordinate"}
            ]}
        }))
        .unwrap();
        let locs = locations(&vbb(), &res, all());
        assert_eq!(locs.len(), 1);
        assert_eq!(locs[0].name(), "Torfstr. 17");

        let none: RawLocMatchResult = serde_json::from_value(json!({})).unwrap();
        assert!(locations(&vbb(), &none, all()).is_empty());
    }

    #[test]
    fn movements_interpolate_frames() {
        let res: RawJourneyListResult = serde_json::from_value(json!({
            "common": common(),
            "jnyL": [{
                "jid": "1|2", "date": "20240315", "prodX": 0, "dirTxt": "Spandau",
                "pos": {"x": 13400000, "y": 52521000},
                "stopL": [{"locX": 1, "aTimeS": "100800"}],
                "ani": {"mSec": [0, 10000], "proc": [0, 50], "fLocX": [0, 0], "tLocX": [1, 1]}
            }]
        }))
        .unwrap();
        let when = t("2024-03-15T10:00:00+01:00");
        let moves = movements(&vbb(), &res, all(), when).unwrap();
        let m = &moves[0];
        assert_eq!(m.next_stopovers.len(), 1);
        assert_eq!(m.frames.len(), 2);
        assert_eq!(m.frames[1].t, t("2024-03-15T10:00:10+01:00"));
        assert_eq!(m.frames[1].progress, Some(0.5));
        let c = m.frames[1].coordinate.unwrap();
        assert!((c.longitude - 13.399).abs() < 1e-9);
        assert!((m.location.unwrap().latitude - 52.521).abs() < 1e-9);
    }

    #[test]
    fn reachable_groups_by_duration() {
        let res: RawReachResult = serde_json::from_value(json!({
            "common": common(),
            "posL": [
                {"locX": 2, "dur": 10},
                {"locX": 0, "dur": 5},
                {"locX": 9, "dur": 7},
                {"locX": 1, "dur": 10}
            ]
        }))
        .unwrap();
        let groups = reachable(&vbb(), &res).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].duration, 5);
        assert_eq!(groups[1].duration, 10);
        assert_eq!(groups[1].stations.len(), 2);
        assert_eq!(groups[1].stations[0].name(), "Hackescher Markt");

        let missing: RawReachResult = serde_json::from_value(json!({})).unwrap();
        let err = reachable(&vbb(), &missing).unwrap_err();
        assert!(err.is_retryable());
    }
}
