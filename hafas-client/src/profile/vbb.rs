//! Verkehrsverbund Berlin-Brandenburg.
//!
//! VBB publishes 12-digit station ids (`900000100003`) but the endpoint
//! wants the 9-digit IBNR form (`900100003`). Requests are converted down
//! and responses back up.

use serde_json::json;

use crate::domain::{Location, Mode};
use crate::hafas::envelope::LocationRef;
use crate::hafas::{HafasError, ProductSpec, ProductTable};

use super::{
    ClientIdentity, CoordinateFormatter, DateTimeFormatter, Features, Profile,
    RequestTransformer, ResponseParser, StationFormatter,
};

const ENDPOINT: &str = "https://fahrinfo.vbb.de/bin/mgate.exe";

/// Builds the VBB profile.
pub fn vbb() -> Profile {
    Profile::new("vbb", ENDPOINT, chrono_tz::Europe::Berlin, products())
        .with_identity(
            ClientIdentity::new()
                .with_field("client", json!({"type": "IPA", "id": "BVG"}))
                .with_field("ext", json!("VBB.2"))
                .with_field("ver", json!("1.11"))
                .with_field("auth", json!({"type": "AID", "aid": "hafas-vbb-apps"})),
        )
        .with_features(Features {
            trip: true,
            radar: true,
            refresh_journey: true,
            reachable_from: true,
            journeys_num_f: false,
            journeys_walking_speed: true,
            accessibility_filters: false,
        })
        .with_hooks(VbbHooks)
}

fn products() -> ProductTable {
    ProductTable::new(vec![
        ProductSpec::new("suburban", Mode::Train, &[1], "S-Bahn", "S"),
        ProductSpec::new("subway", Mode::Train, &[2], "U-Bahn", "U"),
        ProductSpec::new("tram", Mode::Train, &[4], "Tram", "T"),
        ProductSpec::new("bus", Mode::Bus, &[8], "Bus", "B"),
        ProductSpec::new("ferry", Mode::Watercraft, &[16], "Fähre", "F"),
        ProductSpec::new("express", Mode::Train, &[32], "IC/ICE", "E"),
        ProductSpec::new("regional", Mode::Train, &[64], "RB/RE", "R"),
    ])
}

fn is_ibnr(id: &str) -> bool {
    id.len() >= 9 && id.bytes().all(|b| b.is_ascii_digit())
}

/// `900000100003` to `900100003`; other ids unchanged.
fn to_9_digit(id: &str) -> String {
    match id.strip_prefix("900000") {
        Some(rest) if id.len() == 12 => format!("900{rest}"),
        _ => id.to_string(),
    }
}

/// `900100003` to `900000100003`; other ids unchanged.
fn to_12_digit(id: &str) -> String {
    match id.strip_prefix("900") {
        Some(rest) if id.len() == 9 => format!("900000{rest}"),
        _ => id.to_string(),
    }
}

#[derive(Debug, Clone, Copy)]
struct VbbHooks;

impl StationFormatter for VbbHooks {
    fn format_station(&self, id: &str) -> Result<LocationRef, HafasError> {
        if !is_ibnr(id) {
            return Err(HafasError::validation(format!(
                "station id {id:?} must be an IBNR"
            )));
        }
        Ok(LocationRef::station(&to_9_digit(id)))
    }
}

impl ResponseParser for VbbHooks {
    fn parse_location(&self, location: Location) -> Location {
        match location {
            Location::Station(mut s) => {
                s.id = to_12_digit(&s.id);
                Location::Station(s)
            }
            Location::Stop(mut s) => {
                s.id = to_12_digit(&s.id);
                Location::Stop(s)
            }
            other => other,
        }
    }
}

impl CoordinateFormatter for VbbHooks {}
impl DateTimeFormatter for VbbHooks {}
impl RequestTransformer for VbbHooks {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Stop;

    #[test]
    fn id_conversion() {
        assert_eq!(to_9_digit("900000100003"), "900100003");
        assert_eq!(to_9_digit("900100003"), "900100003");
        assert_eq!(to_9_digit("8011160"), "8011160");
        assert_eq!(to_12_digit("900100003"), "900000100003");
        assert_eq!(to_12_digit("900000100003"), "900000100003");
        assert_eq!(to_12_digit("8011160"), "8011160");
    }

    #[test]
    fn station_ids_must_be_ibnr() {
        let hooks = VbbHooks;
        assert!(hooks.format_station("12345").is_err());
        assert!(hooks.format_station("9001000a3").is_err());

        let loc = hooks.format_station("900000100003").unwrap();
        assert_eq!(loc.lid.as_deref(), Some("A=1@L=900100003@"));
    }

    #[test]
    fn parsed_stop_ids_are_widened() {
        let stop = Stop::new("900100003", "S+U Alexanderplatz").unwrap();
        let parsed = VbbHooks.parse_location(Location::Stop(stop));
        assert_eq!(parsed.id(), Some("900000100003"));
    }

    #[test]
    fn profile_shape() {
        let profile = vbb();
        assert_eq!(profile.endpoint, ENDPOINT);
        assert_eq!(profile.identity.fields()["ver"], "1.11");
        assert_eq!(profile.products.products().len(), 7);
        assert_eq!(profile.products.get("ferry").unwrap().mode, Mode::Watercraft);
        assert!(profile.features.trip && profile.features.radar);
    }
}
