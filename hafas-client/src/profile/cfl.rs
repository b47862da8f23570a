//! Société Nationale des Chemins de Fer Luxembourgeois.

use serde_json::json;

use crate::domain::Mode;
use crate::hafas::{ProductSpec, ProductTable};

use super::{ClientIdentity, Features, Profile};

// HTTPS is not served with a valid certificate.
const ENDPOINT: &str = "http://horaires.cfl.lu/bin/mgate.exe";

/// Builds the CFL profile.
pub fn cfl() -> Profile {
    Profile::new("cfl", ENDPOINT, chrono_tz::Europe::Luxembourg, products())
        .with_locale("de-DE")
        .with_language("de")
        .with_identity(
            ClientIdentity::new()
                .with_field(
                    "client",
                    json!({
                        "type": "IPH",
                        "id": "HAFAS",
                        "v": "4000000",
                        "name": "cflPROD-STORE",
                        "os": "iPhone OS 9.3.5"
                    }),
                )
                .with_field("ver", json!("1.16"))
                .with_field("auth", json!({"aid": "ALT2vl7LAFDFu2dz"})),
        )
        .with_features(Features {
            trip: true,
            radar: true,
            ..Features::default()
        })
}

fn products() -> ProductTable {
    ProductTable::new(vec![
        ProductSpec::new(
            "express-train",
            Mode::Train,
            &[1, 2],
            "TGV, ICE, EuroCity",
            "TGV/ICE/EC",
        ),
        ProductSpec::new("local-train", Mode::Train, &[8, 16], "local trains", "local"),
        ProductSpec::new("tram", Mode::Train, &[256], "Tram", "Tram"),
        ProductSpec::new("bus", Mode::Bus, &[32], "Bus", "Bus"),
        ProductSpec::new("gondola", Mode::Gondola, &[512], "Fun", "Fun"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hafas::ProductFilterCodec;

    #[test]
    fn classes_map_to_products() {
        let profile = cfl();
        let codec = &profile.products;
        assert_eq!(codec.product_for_class(16).unwrap().id, "local-train");
        assert_eq!(codec.product_for_class(256).unwrap().mode, Mode::Train);
        assert_eq!(codec.product_for_class(512).unwrap().id, "gondola");
    }

    #[test]
    fn all_products_enabled_by_default() {
        let filter = cfl().products.encode(&Default::default()).unwrap();
        assert_eq!(filter.value(), 1 | 2 | 8 | 16 | 256 | 32 | 512);
    }

    #[test]
    fn optional_operations() {
        let profile = cfl();
        assert!(profile.features.trip);
        assert!(profile.features.radar);
        assert!(!profile.features.reachable_from);
        assert!(!profile.features.refresh_journey);
    }
}
