//! Ingolstädter Verkehrsgesellschaft.
//!
//! The endpoint only accepts signed requests.

use serde_json::json;

use crate::domain::Mode;
use crate::hafas::{ProductSpec, ProductTable};

use super::{ClientIdentity, Features, Profile};

const ENDPOINT: &str = "https://fpa.invg.de/bin/mgate.exe";

const SALT: &str = "ERxotxpwFT7uYRsI";

/// Builds the INVG profile.
pub fn invg() -> Profile {
    Profile::new("invg", ENDPOINT, chrono_tz::Europe::Berlin, products())
        .with_identity(
            ClientIdentity::new()
                .with_field(
                    "client",
                    json!({"type": "IPH", "id": "INVG", "name": "invgPROD", "v": "1020200"}),
                )
                .with_field("ver", json!("1.16"))
                .with_field("auth", json!({"type": "AID", "aid": "GITvwi3BGOmTQ2a5"})),
        )
        .with_features(Features {
            trip: true,
            radar: true,
            refresh_journey: true,
            ..Features::default()
        })
        .with_mic_mac(SALT)
}

fn products() -> ProductTable {
    ProductTable::new(vec![
        ProductSpec::new("bus", Mode::Bus, &[1, 16], "Bus", "Bus"),
        ProductSpec::new("express-train", Mode::Train, &[2], "High-speed train", "Fernzug")
            .with_default(false),
        ProductSpec::new("regional-train", Mode::Train, &[8], "Regional train", "Regionalzug")
            .with_default(false),
    ])
}
