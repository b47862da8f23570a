//! Request envelopes for the `mgate.exe` endpoint.
//!
//! One builder per backend method. Builders take already validated options,
//! format stations, coordinates, times and product filters through the
//! profile's hooks and return an [`Envelope`] ready for the transport.
//! Nothing here performs I/O; every failure is a validation error.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::{Coordinate, Location, ProductFlags, Timestamp};
use crate::profile::Profile;

use super::error::HafasError;
use super::options::{
    BoundingBox, DeparturesOptions, JourneysQuery, LocationsOptions, NearbyOptions,
    RadarOptions, ReachableFromOptions, RefreshJourneyOptions, TripOptions,
};
use super::products::{ProductFilter, ProductFilterCodec};

/// Coordinate in integer micro-degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Crd {
    /// Longitude
    pub x: i64,
    /// Latitude
    pub y: i64,
}

/// A location as the backend expects it in requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationRef {
    /// `S`, `A` or `P`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crd: Option<Crd>,
}

impl LocationRef {
    pub fn station(id: &str) -> Self {
        Self {
            kind: "S".to_string(),
            lid: Some(format!("A=1@L={id}@")),
            name: None,
            crd: None,
        }
    }

    pub fn address(name: &str, crd: Crd) -> Self {
        Self {
            kind: "A".to_string(),
            lid: None,
            name: Some(name.to_string()),
            crd: Some(crd),
        }
    }

    pub fn poi(id: &str, name: &str, crd: Crd) -> Self {
        Self {
            kind: "P".to_string(),
            lid: Some(format!("A=4@O={name}@L={id}@")),
            name: Some(name.to_string()),
            crd: Some(crd),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub ll_crd: Crd,
    pub ur_crd: Crd,
}

/// Auxiliary settings of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cfg {
    pub poly_enc: &'static str,
}

impl Default for Cfg {
    fn default() -> Self {
        Self { poly_enc: "GPA" }
    }
}

/// Entry of `jnyFltrL`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JourneyFilter {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<&'static str>,
}

impl JourneyFilter {
    pub fn meta(meta: &'static str) -> Self {
        Self {
            kind: "META",
            mode: "INC",
            value: None,
            meta: Some(meta),
        }
    }

    /// Only connections that allow bicycles.
    pub fn bike() -> Self {
        Self {
            kind: "BC",
            mode: "INC",
            value: None,
            meta: None,
        }
    }
}

impl From<ProductFilter> for JourneyFilter {
    fn from(filter: ProductFilter) -> Self {
        Self {
            kind: "PROD",
            mode: "INC",
            value: Some(filter.value().to_string()),
            meta: None,
        }
    }
}

/// Entry of `gisFltrL`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GisFilter {
    pub meta: String,
    pub mode: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl GisFilter {
    pub fn walking_speed(speed: &str) -> Self {
        Self {
            meta: format!("foot_speed_{speed}"),
            mode: "FB",
            kind: "M",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoardType {
    #[serde(rename = "DEP")]
    Departures,
    #[serde(rename = "ARR")]
    Arrivals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationBoardRequest {
    #[serde(rename = "type")]
    pub kind: BoardType,
    pub date: String,
    pub time: String,
    pub stb_loc: LocationRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir_loc: Option<LocationRef>,
    pub jny_fltr_l: Vec<JourneyFilter>,
    pub dur: u32,
    pub get_passlist: bool,
    /// Excludes related stations when true.
    pub stb_fltr_equiv: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViaLocation {
    pub loc: LocationRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSearchRequest {
    pub out_date: String,
    pub out_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctx_scr: Option<String>,
    pub get_passlist: bool,
    pub max_chg: u32,
    pub min_chg_time: u32,
    pub dep_loc_l: Vec<LocationRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via_loc_l: Option<Vec<ViaLocation>>,
    pub arr_loc_l: Vec<LocationRef>,
    pub jny_fltr_l: Vec<JourneyFilter>,
    pub get_tariff: bool,
    /// Search forward from `outTime` (false: arrive by).
    pub out_frwd: bool,
    pub ushrp: bool,
    pub gis_fltr_l: Vec<GisFilter>,
    #[serde(rename = "getPT")]
    pub get_pt: bool,
    #[serde(rename = "getIV")]
    pub get_iv: bool,
    pub get_polyline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_f: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconstructionRequest {
    pub ctx_recon: String,
    #[serde(rename = "getIST")]
    pub get_ist: bool,
    pub get_passlist: bool,
    pub get_polyline: bool,
    pub get_tariff: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocMatchLoc {
    /// `ALL` or a combination of `S`, `A` and `P`
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocMatchInput {
    pub loc: LocMatchLoc,
    pub max_loc: u32,
    pub field: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocMatchRequest {
    pub input: LocMatchInput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocDetailsRequest {
    pub loc_l: Vec<LocationRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ring {
    pub c_crd: Crd,
    /// Metres; `-1` for unlimited.
    pub max_dist: i64,
    pub min_dist: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocGeoPosRequest {
    pub ring: Ring,
    #[serde(rename = "getPOIs")]
    pub get_pois: bool,
    pub get_stops: bool,
    pub max_loc: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyDetailsRequest {
    pub jid: String,
    pub name: String,
    pub get_polyline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyGeoPosRequest {
    pub max_jny: u32,
    #[serde(rename = "onlyRT")]
    pub only_rt: bool,
    pub date: String,
    pub time: String,
    pub rect: Rect,
    /// Forecast period in milliseconds.
    pub per_size: u64,
    /// Milliseconds between frames.
    pub per_step: u64,
    pub age_of_report: bool,
    pub jny_fltr_l: Vec<JourneyFilter>,
    pub train_pos_mode: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocGeoReachRequest {
    pub loc: LocationRef,
    pub max_dur: u32,
    pub max_chg: u32,
    pub date: String,
    pub time: String,
    pub period: u32,
    pub jny_fltr_l: Vec<JourneyFilter>,
}

/// A method invocation, serialized as `{"meth": ..., "req": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "meth", content = "req")]
pub enum ServiceRequest {
    StationBoard(StationBoardRequest),
    TripSearch(TripSearchRequest),
    Reconstruction(ReconstructionRequest),
    LocMatch(LocMatchRequest),
    LocDetails(LocDetailsRequest),
    LocGeoPos(LocGeoPosRequest),
    JourneyDetails(JourneyDetailsRequest),
    JourneyGeoPos(JourneyGeoPosRequest),
    LocGeoReach(LocGeoReachRequest),
}

impl ServiceRequest {
    /// Backend method name.
    pub fn method(&self) -> &'static str {
        match self {
            ServiceRequest::StationBoard(_) => "StationBoard",
            ServiceRequest::TripSearch(_) => "TripSearch",
            ServiceRequest::Reconstruction(_) => "Reconstruction",
            ServiceRequest::LocMatch(_) => "LocMatch",
            ServiceRequest::LocDetails(_) => "LocDetails",
            ServiceRequest::LocGeoPos(_) => "LocGeoPos",
            ServiceRequest::JourneyDetails(_) => "JourneyDetails",
            ServiceRequest::JourneyGeoPos(_) => "JourneyGeoPos",
            ServiceRequest::LocGeoReach(_) => "LocGeoReach",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfg: Option<Cfg>,
    #[serde(flatten)]
    pub request: ServiceRequest,
}

impl ServiceCall {
    pub fn new(request: ServiceRequest) -> Self {
        Self { cfg: None, request }
    }

    /// Asks for GPA-encoded polylines.
    pub fn with_cfg(mut self) -> Self {
        self.cfg = Some(Cfg::default());
        self
    }
}

/// The JSON body POSTed to the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub lang: String,
    #[serde(rename = "svcReqL")]
    pub svc_req_l: Vec<ServiceCall>,
    /// Client identity, merged into the top level.
    #[serde(flatten)]
    pub identity: Map<String, Value>,
}

impl Envelope {
    /// Wraps one call with the profile's identity and request transform.
    pub fn new(profile: &Profile, call: ServiceCall) -> Self {
        let envelope = Self {
            lang: profile.language.clone(),
            svc_req_l: vec![call],
            identity: profile.identity.fields().clone(),
        };
        profile.hooks().transform_request(envelope)
    }

    /// Method of the first call.
    pub fn method(&self) -> &'static str {
        self.svc_req_l
            .first()
            .map(|c| c.request.method())
            .unwrap_or("")
    }

    pub fn request(&self) -> Option<&ServiceRequest> {
        self.svc_req_l.first().map(|c| &c.request)
    }
}

fn format_crd(profile: &Profile, coordinate: Coordinate) -> Crd {
    let hooks = profile.hooks();
    Crd {
        x: hooks.format_coordinate(coordinate.longitude),
        y: hooks.format_coordinate(coordinate.latitude),
    }
}

fn product_filter(profile: &Profile, flags: &ProductFlags) -> Result<JourneyFilter, HafasError> {
    Ok(profile.products.encode(flags)?.into())
}

fn format_when(profile: &Profile, when: &Timestamp) -> (String, String) {
    let hooks = profile.hooks();
    (
        hooks.format_date(profile.timezone, when),
        hooks.format_time(profile.timezone, when),
    )
}

/// Formats any location for use in a request.
///
/// Stations and stops go through the profile's station formatter. POIs need
/// an id; addresses need a non-empty address text.
pub fn format_location(profile: &Profile, location: &Location) -> Result<LocationRef, HafasError> {
    match location {
        Location::Station(s) => profile.hooks().format_station(&s.id),
        Location::Stop(s) => profile.hooks().format_station(&s.id),
        Location::Poi(p) => {
            let id = p
                .id
                .as_deref()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| HafasError::validation("poi must have an id"))?;
            Ok(LocationRef::poi(id, &p.name, format_crd(profile, p.coordinate)))
        }
        Location::Address(a) => {
            if a.address.trim().is_empty() {
                return Err(HafasError::validation("address must be a non-empty string"));
            }
            Ok(LocationRef::address(&a.address, format_crd(profile, a.coordinate)))
        }
    }
}

/// Location-match type filter.
pub fn location_filter(stations: bool, addresses: bool, poi: bool) -> String {
    if stations && addresses && poi {
        return "ALL".to_string();
    }
    let mut filter = String::new();
    if stations {
        filter.push('S');
    }
    if addresses {
        filter.push('A');
    }
    if poi {
        filter.push('P');
    }
    filter
}

/// `StationBoard` for departures or arrivals.
pub fn station_board(
    profile: &Profile,
    kind: BoardType,
    station_id: &str,
    opts: &DeparturesOptions,
    when: Timestamp,
) -> Result<Envelope, HafasError> {
    opts.validate()?;
    let hooks = profile.hooks();
    let stb_loc = hooks.format_station(station_id)?;
    let dir_loc = opts
        .direction
        .as_deref()
        .map(|d| hooks.format_station(d))
        .transpose()?;
    let (date, time) = format_when(profile, &when);

    let req = StationBoardRequest {
        kind,
        date,
        time,
        stb_loc,
        dir_loc,
        jny_fltr_l: vec![product_filter(profile, &opts.products)?],
        dur: opts.duration,
        get_passlist: opts.stopovers,
        stb_fltr_equiv: !opts.include_related_stations,
    };
    Ok(Envelope::new(
        profile,
        ServiceCall::new(ServiceRequest::StationBoard(req)),
    ))
}

/// Everything about a trip search except the page position.
///
/// Built once per `journeys` call; [`TripSearch::page`] then produces the
/// envelope for each round-trip.
#[derive(Debug, Clone)]
pub struct TripSearch {
    template: TripSearchRequest,
}

impl TripSearch {
    pub fn new(
        profile: &Profile,
        from: &Location,
        to: &Location,
        query: &JourneysQuery,
    ) -> Result<Self, HafasError> {
        let opts = query.options();
        let from = format_location(profile, from)?;
        let to = format_location(profile, to)?;
        let via = opts
            .via
            .as_ref()
            .map(|v| format_location(profile, v))
            .transpose()?;

        let mut filters = vec![product_filter(profile, &opts.products)?];
        if profile.features.accessibility_filters {
            if let Some(meta) = opts.accessibility.meta() {
                filters.push(JourneyFilter::meta(meta));
            }
        }
        if opts.bike {
            filters.push(JourneyFilter::bike());
        }

        let mut gis_fltr_l = Vec::new();
        if profile.features.journeys_walking_speed {
            gis_fltr_l.push(GisFilter::walking_speed(opts.walking_speed.as_str()));
        }

        let num_f = if profile.features.journeys_num_f {
            opts.results
        } else {
            None
        };

        let template = TripSearchRequest {
            out_date: String::new(),
            out_time: String::new(),
            ctx_scr: None,
            get_passlist: opts.stopovers,
            max_chg: opts.transfers,
            min_chg_time: opts.transfer_time,
            dep_loc_l: vec![from],
            via_loc_l: via.map(|loc| vec![ViaLocation { loc }]),
            arr_loc_l: vec![to],
            jny_fltr_l: filters,
            get_tariff: opts.tickets,
            out_frwd: !query.start().is_arrival(),
            ushrp: opts.start_with_walking,
            gis_fltr_l,
            get_pt: true,
            get_iv: false,
            get_polyline: opts.polylines,
            num_f,
        };

        Ok(Self { template })
    }

    /// Envelope for one page starting at `when`, continuing from `cursor`.
    pub fn page(&self, profile: &Profile, when: Timestamp, cursor: Option<&str>) -> Envelope {
        let (out_date, out_time) = format_when(profile, &when);
        let req = TripSearchRequest {
            out_date,
            out_time,
            ctx_scr: cursor.map(str::to_string),
            ..self.template.clone()
        };
        Envelope::new(
            profile,
            ServiceCall::new(ServiceRequest::TripSearch(req)).with_cfg(),
        )
    }
}

/// `Reconstruction` of a journey from its refresh token.
pub fn reconstruction(
    profile: &Profile,
    refresh_token: &str,
    opts: &RefreshJourneyOptions,
) -> Result<Envelope, HafasError> {
    if refresh_token.trim().is_empty() {
        return Err(HafasError::validation("refresh token must be a non-empty string"));
    }
    let req = ReconstructionRequest {
        ctx_recon: refresh_token.to_string(),
        get_ist: true,
        get_passlist: opts.stopovers,
        get_polyline: opts.polylines,
        get_tariff: opts.tickets,
    };
    Ok(Envelope::new(
        profile,
        ServiceCall::new(ServiceRequest::Reconstruction(req)),
    ))
}

/// `LocMatch` free-text search.
pub fn loc_match(
    profile: &Profile,
    query: &str,
    opts: &LocationsOptions,
) -> Result<Envelope, HafasError> {
    if query.trim().is_empty() {
        return Err(HafasError::validation("query must be a non-empty string"));
    }
    opts.validate()?;
    let name = if opts.fuzzy {
        format!("{query}?")
    } else {
        query.to_string()
    };
    let req = LocMatchRequest {
        input: LocMatchInput {
            loc: LocMatchLoc {
                kind: location_filter(opts.stations, opts.addresses, opts.poi),
                name,
            },
            max_loc: opts.results,
            field: "S",
        },
    };
    Ok(Envelope::new(
        profile,
        ServiceCall::new(ServiceRequest::LocMatch(req)).with_cfg(),
    ))
}

/// `LocDetails` of one station.
pub fn loc_details(profile: &Profile, station_id: &str) -> Result<Envelope, HafasError> {
    let station = profile.hooks().format_station(station_id)?;
    let req = LocDetailsRequest {
        loc_l: vec![station],
    };
    Ok(Envelope::new(
        profile,
        ServiceCall::new(ServiceRequest::LocDetails(req)),
    ))
}

/// `LocGeoPos` around a coordinate.
pub fn loc_geo_pos(
    profile: &Profile,
    center: Coordinate,
    opts: &NearbyOptions,
) -> Result<Envelope, HafasError> {
    opts.validate()?;
    let req = LocGeoPosRequest {
        ring: Ring {
            c_crd: format_crd(profile, center),
            max_dist: opts.distance.map_or(-1, i64::from),
            min_dist: 0,
        },
        get_pois: opts.poi,
        get_stops: opts.stations,
        max_loc: opts.results,
    };
    Ok(Envelope::new(
        profile,
        ServiceCall::new(ServiceRequest::LocGeoPos(req)).with_cfg(),
    ))
}

/// `JourneyDetails` of one trip.
pub fn journey_details(
    profile: &Profile,
    trip_id: &str,
    line_name: &str,
    opts: &TripOptions,
) -> Result<Envelope, HafasError> {
    if trip_id.trim().is_empty() {
        return Err(HafasError::validation("trip id must be a non-empty string"));
    }
    if line_name.trim().is_empty() {
        return Err(HafasError::validation("line name must be a non-empty string"));
    }
    let req = JourneyDetailsRequest {
        jid: trip_id.to_string(),
        name: line_name.to_string(),
        get_polyline: opts.polyline,
    };
    Ok(Envelope::new(
        profile,
        ServiceCall::new(ServiceRequest::JourneyDetails(req)).with_cfg(),
    ))
}

/// `JourneyGeoPos` inside a rectangle.
pub fn journey_geo_pos(
    profile: &Profile,
    bbox: &BoundingBox,
    opts: &RadarOptions,
    when: Timestamp,
) -> Result<Envelope, HafasError> {
    opts.validate()?;
    let (date, time) = format_when(profile, &when);
    let req = JourneyGeoPosRequest {
        max_jny: opts.results,
        only_rt: false,
        date,
        time,
        rect: profile.hooks().format_rectangle(bbox),
        per_size: u64::from(opts.duration) * 1000,
        per_step: opts.step_millis(),
        age_of_report: true,
        jny_fltr_l: vec![product_filter(profile, &opts.products)?],
        train_pos_mode: "CALC",
    };
    Ok(Envelope::new(
        profile,
        ServiceCall::new(ServiceRequest::JourneyGeoPos(req)),
    ))
}

/// `LocGeoReach` from a location.
pub fn loc_geo_reach(
    profile: &Profile,
    origin: &Location,
    opts: &ReachableFromOptions,
    when: Timestamp,
) -> Result<Envelope, HafasError> {
    opts.validate()?;
    let loc = format_location(profile, origin)?;
    let (date, time) = format_when(profile, &when);
    let req = LocGeoReachRequest {
        loc,
        max_dur: opts.max_duration,
        max_chg: opts.max_transfers,
        date,
        time,
        period: 120,
        jny_fltr_l: vec![product_filter(profile, &opts.products)?],
    };
    Ok(Envelope::new(
        profile,
        ServiceCall::new(ServiceRequest::LocGeoReach(req)),
    ))
}
