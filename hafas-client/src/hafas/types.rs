//! Backend response DTOs.
//!
//! These types map directly to the `mgate.exe` JSON responses. They use
//! `Option` and `#[serde(default)]` liberally because the backend omits
//! fields rather than sending null values. Entries of the shared arrays in
//! `common` are kept as raw JSON so that one malformed entry only blanks
//! its own slot.

use serde::Deserialize;
use serde_json::Value;

/// Top-level reply to an envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResponse {
    pub err: Option<String>,
    pub err_txt: Option<String>,
    pub svc_res_l: Option<Vec<RawServiceResult>>,
}

/// Result of one method invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawServiceResult {
    pub meth: Option<String>,
    pub err: Option<String>,
    pub err_txt: Option<String>,
    pub res: Option<Value>,
}

/// Shared arrays referenced by index from the primary records.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCommon {
    pub loc_l: Vec<Value>,
    pub prod_l: Vec<Value>,
    pub rem_l: Vec<Value>,
    pub him_l: Vec<Value>,
    pub ico_l: Vec<Value>,
    pub op_l: Vec<Value>,
    pub poly_l: Vec<Value>,
}

/// Coordinate in micro-degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RawCoord {
    /// Longitude
    pub x: i64,
    /// Latitude
    pub y: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocation {
    pub lid: Option<String>,
    /// `S` (stop), `P` (POI) or `A` (address)
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub ext_id: Option<String>,
    pub crd: Option<RawCoord>,
    /// Product classes served here
    pub p_cls: Option<u32>,
    /// Indices into `prodL` of lines serving this stop
    pub p_ref_l: Option<Vec<usize>>,
    /// Index of the parent station in `locL`
    pub m_mast_loc_x: Option<usize>,
    pub is_main_mast: Option<bool>,
    /// Distance in metres (`LocGeoPos` only)
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    pub name: Option<String>,
    pub cls: Option<u32>,
    pub opr_x: Option<usize>,
    pub prod_ctx: Option<RawProductContext>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProductContext {
    pub name: Option<String>,
    pub num: Option<String>,
    pub line: Option<String>,
    pub cat_out: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOperator {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawIcon {
    pub res: Option<String>,
    pub text: Option<String>,
    /// Either a `#rrggbb` string or an `{r, g, b}` object
    pub fg: Option<Value>,
    pub bg: Option<Value>,
}

/// Entry of `remL`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHint {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub code: Option<String>,
    pub txt_n: Option<String>,
    pub ico_x: Option<usize>,
}

/// Entry of `himL`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWarning {
    pub hid: Option<String>,
    pub head: Option<String>,
    pub text: Option<String>,
    pub prio: Option<i64>,
    pub cat: Option<i64>,
    pub ico_x: Option<usize>,
    pub s_date: Option<String>,
    pub s_time: Option<String>,
    pub e_date: Option<String>,
    pub e_time: Option<String>,
}

/// Entry of `polyL`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPolyline {
    #[serde(rename = "crdEncYX")]
    pub crd_enc_yx: String,
}

/// Reference to a hint (`REM`) or warning (`HIM`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRemarkRef {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub rem_x: Option<usize>,
    pub him_x: Option<usize>,
}

/// Arrival and departure fields at one stop.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawStop {
    pub loc_x: Option<usize>,
    pub idx: Option<u32>,
    pub d_time_s: Option<String>,
    pub d_time_r: Option<String>,
    pub d_platf_s: Option<String>,
    pub d_platf_r: Option<String>,
    pub d_cncl: Option<bool>,
    pub a_time_s: Option<String>,
    pub a_time_r: Option<String>,
    pub a_platf_s: Option<String>,
    pub a_platf_r: Option<String>,
    pub a_cncl: Option<bool>,
    /// Boarding allowed
    pub d_in_s: Option<bool>,
    /// Alighting allowed
    pub a_out_s: Option<bool>,
    /// Remark references, parsed one by one as [`RawRemarkRef`]
    pub msg_l: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPolyGroup {
    pub poly_x_l: Vec<usize>,
}

/// Journey record shared by station boards, trip search sections, journey
/// details and radar.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawJourney {
    pub jid: Option<String>,
    pub date: Option<String>,
    pub prod_x: Option<usize>,
    pub dir_txt: Option<String>,
    pub stb_stop: Option<RawStop>,
    pub stop_l: Option<Vec<RawStop>>,
    pub rem_l: Vec<Value>,
    pub msg_l: Vec<Value>,
    pub poly_g: Option<RawPolyGroup>,
    /// Current position (radar)
    pub pos: Option<RawCoord>,
    pub ani: Option<RawAnimation>,
}

/// Forecast animation of a vehicle (radar).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAnimation {
    /// Frame offsets in milliseconds from the query time
    pub m_sec: Vec<i64>,
    /// Progress between `fLocX` and `tLocX`, in percent
    pub proc: Vec<f64>,
    pub f_loc_x: Vec<usize>,
    pub t_loc_x: Vec<usize>,
    pub poly_g: Option<RawPolyGroup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGis {
    pub dist: Option<u32>,
}

/// One leg of a connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSection {
    /// `JNY` for rides, `WALK`/`TRSF`/`GIS`/... for everything else
    #[serde(rename = "type")]
    pub kind: String,
    pub dep: RawStop,
    pub arr: RawStop,
    pub jny: Option<RawJourney>,
    pub gis: Option<RawGis>,
}

/// A connection from `outConL`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConnection {
    pub date: String,
    pub ctx_recon: Option<String>,
    #[serde(default)]
    pub sec_l: Vec<RawSection>,
}

/// Entry of `posL` (`LocGeoReach`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReachable {
    pub loc_x: usize,
    pub dur: u32,
}

/// `StationBoard` and `JourneyGeoPos` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawJourneyListResult {
    #[serde(default)]
    pub common: RawCommon,
    pub jny_l: Option<Vec<RawJourney>>,
}

/// `TripSearch` and `Reconstruction` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTripSearchResult {
    #[serde(default)]
    pub common: RawCommon,
    pub out_con_l: Option<Vec<RawConnection>>,
    pub out_ctx_scr_b: Option<String>,
    pub out_ctx_scr_f: Option<String>,
}

/// `LocDetails` and `LocGeoPos` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocationListResult {
    #[serde(default)]
    pub common: RawCommon,
    pub loc_l: Option<Vec<Value>>,
}

/// `LocMatch` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocMatchResult {
    #[serde(default)]
    pub common: RawCommon,
    pub r#match: Option<RawLocationListResult>,
}

/// `JourneyDetails` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawJourneyDetailsResult {
    #[serde(default)]
    pub common: RawCommon,
    pub journey: Option<RawJourney>,
}

/// `LocGeoReach` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReachResult {
    #[serde(default)]
    pub common: RawCommon,
    pub pos_l: Option<Vec<RawReachable>>,
}
