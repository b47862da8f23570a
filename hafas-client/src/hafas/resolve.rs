//! Cross-reference resolution of the `common` block.
//!
//! Responses carry shared arrays (`locL`, `prodL`, `remL`, `himL`, `icoL`,
//! `opL`, `polyL`) and primary records that point into them by index. The
//! arrays are parsed once per response into [`Shared`]; records then look
//! entries up by index and get an `Arc` to the same object. An absent or
//! out-of-range index resolves to `None`, as does an entry that failed to
//! parse.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::domain::{
    Address, Coordinate, Hint, Icon, Line, Location, Operator, Poi, Polyline, Remark, Station,
    Stop, Warning, slug,
};
use crate::profile::Profile;

use super::products::ProductFilterCodec;
use super::time;
use super::types::{
    RawCommon, RawCoord, RawHint, RawIcon, RawLocation, RawOperator, RawPolyline, RawProduct,
    RawRemarkRef, RawWarning,
};

/// What to resolve beyond locations and lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Parse hints and warnings.
    pub remarks: bool,
    /// Decode polylines.
    pub polylines: bool,
    /// Attach the lines serving a station to it.
    pub station_lines: bool,
}

type Slots<T> = Vec<Option<Arc<T>>>;

fn lookup<T>(slots: &[Option<Arc<T>>], index: Option<usize>) -> Option<Arc<T>> {
    index.and_then(|i| slots.get(i)).and_then(|slot| slot.clone())
}

/// Deserializes each entry on its own; failures leave an empty slot.
fn parse_slots<R, T>(kind: &'static str, raw: &[Value], mut parse: impl FnMut(R) -> Option<T>) -> Slots<T>
where
    R: DeserializeOwned,
{
    raw.iter()
        .enumerate()
        .map(|(index, value)| match R::deserialize(value) {
            Ok(r) => parse(r).map(Arc::new),
            Err(e) => {
                warn!(kind, index, error = %e, "Skipping unparsable record");
                None
            }
        })
        .collect()
}

/// Converts a backend micro-degree pair.
pub fn parse_coordinate(crd: RawCoord) -> Option<Coordinate> {
    Coordinate::new(crd.y as f64 / 1e6, crd.x as f64 / 1e6).ok()
}

/// Resolved shared arrays of one response.
#[derive(Debug, Clone, Default)]
pub struct Shared {
    options: ResolveOptions,
    icons: Slots<Icon>,
    operators: Slots<Operator>,
    hints: Slots<Remark>,
    warnings: Slots<Remark>,
    lines: Slots<Line>,
    locations: Slots<Location>,
    polylines: Slots<Polyline>,
}

impl Shared {
    /// Parses every shared array of `common`.
    pub fn resolve(profile: &Profile, common: &RawCommon, options: ResolveOptions) -> Self {
        let mut shared = Shared {
            options,
            ..Shared::default()
        };

        shared.icons = parse_slots("icon", &common.ico_l, |r: RawIcon| Some(parse_icon(r)));
        shared.operators = parse_slots("operator", &common.op_l, |r: RawOperator| {
            Some(Operator::new(r.name.trim()))
        });

        if options.remarks {
            shared.hints = parse_slots("hint", &common.rem_l, |r: RawHint| {
                Some(Remark::Hint(Hint {
                    code: r.code,
                    text: r.txt_n,
                    hint_type: r.kind,
                    icon: lookup(&shared.icons, r.ico_x),
                }))
            });
            shared.warnings = parse_slots("warning", &common.him_l, |r: RawWarning| {
                Some(shared.parse_warning(profile, r))
            });
        }

        shared.lines = parse_slots("line", &common.prod_l, |r: RawProduct| {
            Some(shared.parse_line(profile, r))
        });
        shared.locations = shared.parse_locations(profile, &common.loc_l);

        if options.polylines {
            shared.polylines = parse_slots("polyline", &common.poly_l, |r: RawPolyline| {
                decode_polyline(&r.crd_enc_yx).map(|points| Polyline { points })
            });
        }

        shared
    }

    pub fn location(&self, index: Option<usize>) -> Option<Arc<Location>> {
        lookup(&self.locations, index)
    }

    pub fn line(&self, index: Option<usize>) -> Option<Arc<Line>> {
        lookup(&self.lines, index)
    }

    pub fn hint(&self, index: Option<usize>) -> Option<Arc<Remark>> {
        lookup(&self.hints, index)
    }

    pub fn warning(&self, index: Option<usize>) -> Option<Arc<Remark>> {
        lookup(&self.warnings, index)
    }

    pub fn polyline(&self, index: Option<usize>) -> Option<Arc<Polyline>> {
        lookup(&self.polylines, index)
    }

    pub fn options(&self) -> ResolveOptions {
        self.options
    }

    /// Resolves remark references, dropping any that are unparsable or
    /// point nowhere.
    pub fn remarks<'a>(&self, refs: impl IntoIterator<Item = &'a Value>) -> Vec<Arc<Remark>> {
        if !self.options.remarks {
            return Vec::new();
        }
        refs.into_iter()
            .filter_map(|value| RawRemarkRef::deserialize(value).ok())
            .filter_map(|r| match r.kind.as_deref() {
                Some("REM") => self.hint(r.rem_x),
                Some("HIM") => self.warning(r.him_x),
                _ => self.hint(r.rem_x).or_else(|| self.warning(r.him_x)),
            })
            .collect()
    }

    fn parse_warning(&self, profile: &Profile, r: RawWarning) -> Remark {
        let at = |date: &Option<String>, clock: &Option<String>| match (date, clock) {
            (Some(d), Some(t)) => time::parse_date_time(profile.timezone, d, t).ok(),
            _ => None,
        };
        Remark::Warning(Warning {
            id: r.hid.clone(),
            summary: r.head.clone(),
            text: r.text.clone(),
            priority: r.prio,
            category: r.cat,
            valid_from: at(&r.s_date, &r.s_time),
            valid_until: at(&r.e_date, &r.e_time),
            icon: lookup(&self.icons, r.ico_x),
        })
    }

    fn parse_line(&self, profile: &Profile, r: RawProduct) -> Line {
        let ctx = r.prod_ctx.as_ref();
        let name = r
            .name
            .as_deref()
            .or_else(|| ctx.and_then(|c| c.line.as_deref()))
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let product = r.cls.and_then(|cls| profile.products.product_for_class(cls));

        let line = Line {
            id: name.map(slug).filter(|id| !id.is_empty()),
            name: name.map(str::to_string),
            mode: product.map(|p| p.mode),
            product: product.map(|p| p.id.clone()),
            class: r.cls,
            fahrt_nr: ctx.and_then(|c| c.num.clone()),
            public: true,
            operator: lookup(&self.operators, r.opr_x),
        };
        profile.hooks().parse_line(line)
    }

    /// Parses a list of location records, attaching parent stations
    /// referenced through `mMastLocX` within the same list.
    pub fn parse_locations(&self, profile: &Profile, raw: &[Value]) -> Slots<Location> {
        let parsed: Vec<Option<RawLocation>> = raw
            .iter()
            .enumerate()
            .map(|(index, value)| {
                RawLocation::deserialize(value)
                    .map_err(|e| warn!(kind = "location", index, error = %e, "Skipping unparsable record"))
                    .ok()
            })
            .collect();

        let first: Vec<Option<Location>> = parsed
            .iter()
            .map(|r| r.as_ref().and_then(|r| self.parse_location(profile, r)))
            .collect();

        // Parent stations are shared by every stop of the same station.
        let mut parents: HashMap<usize, Option<Arc<Station>>> = HashMap::new();

        first
            .iter()
            .zip(&parsed)
            .map(|(loc, raw)| {
                let loc = loc.clone()?;
                let Some(raw) = raw else {
                    return Some(Arc::new(loc));
                };
                let loc = match (loc, raw.m_mast_loc_x) {
                    (Location::Stop(mut stop), Some(parent)) => {
                        let station = parents
                            .entry(parent)
                            .or_insert_with(|| {
                                first
                                    .get(parent)
                                    .and_then(Option::as_ref)
                                    .and_then(Location::to_station)
                                    .map(Arc::new)
                            })
                            .clone();
                        if station.is_some() {
                            stop.station = station;
                        }
                        Location::Stop(stop)
                    }
                    (loc, None) if raw.is_main_mast == Some(true) => loc.promote_to_station(),
                    (loc, _) => loc,
                };
                Some(Arc::new(loc))
            })
            .collect()
    }

    fn parse_location(&self, profile: &Profile, r: &RawLocation) -> Option<Location> {
        let name = r.name.clone().unwrap_or_default();
        let coordinate = r.crd.and_then(parse_coordinate);
        let id = r
            .ext_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| r.lid.as_deref().and_then(lid_id));

        let location = match r.kind.as_deref() {
            Some("S") => {
                let mut stop = Stop::new(id.unwrap_or_default(), name)
                    .map_err(|e| warn!(error = %e, "Skipping stop without id"))
                    .ok()?;
                stop.coordinate = coordinate;
                stop.products = r.p_cls.map(|cls| profile.products.decode_flags(cls));
                if self.options.station_lines {
                    stop.lines = r.p_ref_l.as_ref().map(|refs| {
                        refs.iter().filter_map(|&i| self.line(Some(i))).collect()
                    });
                }
                Location::Stop(stop)
            }
            Some("P") => Location::Poi(Poi {
                id,
                name,
                coordinate: coordinate?,
            }),
            Some("A") => Location::Address(Address {
                address: name,
                coordinate: coordinate?,
            }),
            _ => return None,
        };
        Some(profile.hooks().parse_location(location))
    }
}

/// Extracts the `L=` field of a location id such as `A=1@O=Foo@L=123@`.
fn lid_id(lid: &str) -> Option<String> {
    lid.split('@')
        .find_map(|part| part.strip_prefix("L="))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// `#rrggbb` from a colour string or an `{r, g, b}` object.
fn color(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(o) => {
            let channel = |k: &str| o.get(k).and_then(Value::as_u64).map(|c| c.min(255));
            Some(format!(
                "#{:02x}{:02x}{:02x}",
                channel("r")?,
                channel("g")?,
                channel("b")?
            ))
        }
        _ => None,
    }
}

fn parse_icon(r: RawIcon) -> Icon {
    Icon {
        kind: r.res,
        title: r.text,
        fg_color: r.fg.as_ref().and_then(color),
        bg_color: r.bg.as_ref().and_then(color),
    }
}

fn next_value(bytes: &[u8], pos: &mut usize) -> Option<i64> {
    let mut result = 0i64;
    let mut shift = 0;
    loop {
        let chunk = i64::from(*bytes.get(*pos)?) - 63;
        *pos += 1;
        if !(0..64).contains(&chunk) || shift > 60 {
            return None;
        }
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }
    Some(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}

/// Decodes a GPA (Google polyline, precision 5) string.
///
/// Returns `None` if the string is truncated or contains invalid points.
///
/// # Examples
///
/// ```
/// use hafas_client::hafas::resolve::decode_polyline;
///
/// let points = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
/// assert_eq!(points.len(), 3);
/// assert_eq!(points[0].latitude, 38.5);
/// assert_eq!(points[0].longitude, -120.2);
/// ```
pub fn decode_polyline(encoded: &str) -> Option<Vec<Coordinate>> {
    let bytes = encoded.as_bytes();
    let mut pos = 0;
    let (mut lat, mut lon) = (0i64, 0i64);
    let mut points = Vec::new();
    while pos < bytes.len() {
        lat += next_value(bytes, &mut pos)?;
        lon += next_value(bytes, &mut pos)?;
        points.push(Coordinate::new(lat as f64 / 1e5, lon as f64 / 1e5).ok()?);
    }
    Some(points)
}
