//! Client for HAFAS public transport backends.
//!
//! Answers departures, arrivals, journeys, location search, nearby
//! stations, trips, vehicle positions and reachability for any deployment
//! described by a [`profile::Profile`], returning provider-agnostic
//! [`domain`] records.

pub mod domain;
pub mod hafas;
pub mod profile;
