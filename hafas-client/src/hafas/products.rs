//! Product (transport mode) bitmask codec.
//!
//! Each profile owns an ordered table of products. A product claims one or
//! more bits of the backend's class bitmask; a request filter is the OR of
//! the bits of every enabled product.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::domain::{Mode, ProductFlags};

use super::error::HafasError;

/// One row of a profile's product table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSpec {
    /// Semantic id used in [`ProductFlags`], e.g. `"subway"`.
    pub id: String,
    pub mode: Mode,
    /// Individual class bits claimed by this product.
    pub bitmasks: Vec<u32>,
    pub name: String,
    pub short: String,
    /// Enabled when the caller does not mention this product.
    pub default: bool,
}

impl ProductSpec {
    /// Creates a product that is enabled by default.
    pub fn new(
        id: impl Into<String>,
        mode: Mode,
        bitmasks: &[u32],
        name: impl Into<String>,
        short: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            mode,
            bitmasks: bitmasks.to_vec(),
            name: name.into(),
            short: short.into(),
            default: true,
        }
    }

    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    /// All bits of this product combined.
    pub fn bits(&self) -> u32 {
        self.bitmasks.iter().fold(0, |acc, b| acc | b)
    }
}

/// Encoded product filter, serialized as the backend's `PROD` descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductFilter {
    value: u32,
}

impl ProductFilter {
    pub fn value(&self) -> u32 {
        self.value
    }
}

impl Serialize for ProductFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ProductFilter", 3)?;
        s.serialize_field("type", "PROD")?;
        s.serialize_field("mode", "INC")?;
        s.serialize_field("value", &self.value.to_string())?;
        s.end()
    }
}

/// Encoding of product flags to and from class bitmasks.
pub trait ProductFilterCodec {
    /// Encodes caller flags, starting from each product's default.
    ///
    /// Unknown product ids are a validation error.
    fn encode(&self, flags: &ProductFlags) -> Result<ProductFilter, HafasError>;

    /// Finds the product a line's class belongs to.
    fn product_for_class(&self, class: u32) -> Option<&ProductSpec>;

    /// Expands a combined bitmask (e.g. the classes served at a station).
    fn decode_flags(&self, bitmask: u32) -> ProductFlags;
}

/// Ordered product table of a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductTable {
    products: Vec<ProductSpec>,
    allow_empty: bool,
}

impl ProductTable {
    pub fn new(products: Vec<ProductSpec>) -> Self {
        Self {
            products,
            allow_empty: true,
        }
    }

    /// Rejects filters with no product enabled.
    pub fn with_empty_filter_forbidden(mut self) -> Self {
        self.allow_empty = false;
        self
    }

    pub fn products(&self) -> &[ProductSpec] {
        &self.products
    }

    pub fn get(&self, id: &str) -> Option<&ProductSpec> {
        self.products.iter().find(|p| p.id == id)
    }
}

impl ProductFilterCodec for ProductTable {
    /// # Examples
    ///
    /// ```
    /// use hafas_client::domain::{Mode, ProductFlags};
    /// use hafas_client::hafas::{ProductFilterCodec, ProductSpec, ProductTable};
    ///
    /// let table = ProductTable::new(vec![
    ///     ProductSpec::new("suburban", Mode::Train, &[1], "S-Bahn", "S"),
    ///     ProductSpec::new("bus", Mode::Bus, &[8], "Bus", "B"),
    /// ]);
    ///
    /// let mut flags = ProductFlags::new();
    /// flags.insert("bus".into(), false);
    /// assert_eq!(table.encode(&flags).unwrap().value(), 1);
    ///
    /// flags.insert("zeppelin".into(), true);
    /// assert!(table.encode(&flags).is_err());
    /// ```
    fn encode(&self, flags: &ProductFlags) -> Result<ProductFilter, HafasError> {
        if let Some(unknown) = flags.keys().find(|id| self.get(id).is_none()) {
            return Err(HafasError::validation(format!("unknown product '{unknown}'")));
        }

        let value = self
            .products
            .iter()
            .filter(|p| flags.get(&p.id).copied().unwrap_or(p.default))
            .fold(0, |acc, p| acc | p.bits());

        if value == 0 && !self.allow_empty {
            return Err(HafasError::validation("at least one product must be enabled"));
        }
        Ok(ProductFilter { value })
    }

    fn product_for_class(&self, class: u32) -> Option<&ProductSpec> {
        self.products
            .iter()
            .find(|p| p.bitmasks.contains(&class))
            .or_else(|| self.products.iter().find(|p| p.bits() & class != 0))
    }

    fn decode_flags(&self, bitmask: u32) -> ProductFlags {
        self.products
            .iter()
            .map(|p| (p.id.clone(), p.bits() & bitmask != 0))
            .collect()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Table where "tram" and "light-rail" share bit 4.
    fn overlapping() -> ProductTable {
        ProductTable::new(vec![
            ProductSpec::new("suburban", Mode::Train, &[1], "S", "S"),
            ProductSpec::new("subway", Mode::Train, &[2], "U", "U"),
            ProductSpec::new("tram", Mode::Train, &[4], "Tram", "T"),
            ProductSpec::new("light-rail", Mode::Train, &[4, 64], "Light rail", "LR")
                .with_default(false),
            ProductSpec::new("bus", Mode::Bus, &[8], "Bus", "B"),
            ProductSpec::new("ferry", Mode::Watercraft, &[16], "Ferry", "F"),
        ])
    }

    const IDS: [&str; 6] = ["suburban", "subway", "tram", "light-rail", "bus", "ferry"];

    fn flag_map() -> impl Strategy<Value = ProductFlags> {
        proptest::collection::vec(proptest::option::of(any::<bool>()), IDS.len()).prop_map(
            |choices| {
                IDS.iter()
                    .zip(choices)
                    .filter_map(|(id, c)| c.map(|v| (id.to_string(), v)))
                    .collect()
            },
        )
    }

    proptest! {
        /// decode(encode(M)) enables at least every product enabled in M
        #[test]
        fn decode_encode_is_superset(m in flag_map()) {
            let table = overlapping();
            let decoded = table.decode_flags(table.encode(&m).unwrap().value());

            for (id, enabled) in &m {
                if *enabled {
                    prop_assert!(decoded[id], "{} enabled but not decoded", id);
                }
            }
        }

        /// Every product left at its default keeps it after the round trip
        #[test]
        fn defaults_survive(m in flag_map()) {
            let table = overlapping();
            let decoded = table.decode_flags(table.encode(&m).unwrap().value());

            for p in table.products() {
                if !m.contains_key(&p.id) && p.default {
                    prop_assert!(decoded[&p.id]);
                }
            }
        }

        /// A product's own bit always maps back to a product sharing it
        #[test]
        fn class_lookup_finds_owner(idx in 0usize..6) {
            let table = overlapping();
            let spec = &table.products()[idx];
            let found = table.product_for_class(spec.bitmasks[0]).unwrap();
            prop_assert!(found.bits() & spec.bitmasks[0] != 0);
        }
    }
}
