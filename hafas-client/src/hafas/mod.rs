//! Client for HAFAS `mgate.exe` endpoints.
//!
//! Every query is one JSON envelope POSTed to the endpoint, answered by one
//! JSON response whose records point into shared arrays by index.
//!
//! Key characteristics of the protocol:
//! - Dates are `YYYYMMDD` and times `HHMMSS` in the profile's timezone,
//!   with an optional day-offset prefix (`01003000` is 00:30 the next day)
//! - Products are selected with a bitmask of product classes
//! - Realtime data comes as separate `*R` fields next to the scheduled `*S`
//!   fields and has to be reconciled
//! - Trip search pages are continued with opaque context cursors

mod client;
pub mod convert;
pub mod envelope;
mod error;
mod fixture;
pub mod options;
pub mod pagination;
mod products;
pub mod resolve;
pub mod retry;
mod signing;
pub mod time;
mod transport;
pub mod types;

pub use client::HafasClient;
pub use error::{HafasError, TransportError};
pub use fixture::FixtureTransport;
pub use products::{ProductFilter, ProductFilterCodec, ProductSpec, ProductTable};
pub use retry::RetryPolicy;
pub use signing::MicMac;
pub use transport::{ClientConfig, HttpTransport, Transport, extract_result};
