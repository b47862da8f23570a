//! The client facade.
//!
//! [`HafasClient`] validates options, builds the envelope, sends it through
//! a [`Transport`], checks the response codes and converts the result into
//! domain types. Operations the profile does not offer fail with
//! [`HafasError::Unsupported`] before anything is sent.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::{
    Address, Coordinate, Journey, JourneyList, Location, Movement, NearbyLocation,
    ReachableGroup, StationBoardEntry, Timestamp, TransitLeg,
};
use crate::profile::Profile;

use super::convert::{self, JourneyPage};
use super::envelope::{self, BoardType, Envelope, TripSearch};
use super::error::HafasError;
use super::options::{
    ArrivalsOptions, BoundingBox, DeparturesOptions, JourneysOptions, LocationsOptions,
    NearbyOptions, RadarOptions, ReachableFromOptions, RefreshJourneyOptions, StationOptions,
    TripOptions,
};
use super::pagination::{self, PageSource};
use super::resolve::ResolveOptions;
use super::retry::RetryPolicy;
use super::transport::{Transport, extract_result};
use super::types::{
    RawJourneyDetailsResult, RawJourneyListResult, RawLocMatchResult, RawLocationListResult,
    RawReachResult, RawTripSearchResult,
};

/// Client for one backend deployment.
#[derive(Debug, Clone)]
pub struct HafasClient<T> {
    profile: Arc<Profile>,
    transport: T,
    retry: RetryPolicy,
}

impl<T: Transport> HafasClient<T> {
    pub fn new(profile: impl Into<Arc<Profile>>, transport: T) -> Self {
        Self {
            profile: profile.into(),
            transport,
            retry: RetryPolicy::default(),
        }
    }

    /// Backoff used by [`HafasClient::reachable_from`].
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    fn now(&self) -> Timestamp {
        Utc::now().with_timezone(&self.profile.timezone).fixed_offset()
    }

    fn require(&self, enabled: bool, operation: &'static str) -> Result<(), HafasError> {
        if enabled {
            Ok(())
        } else {
            Err(HafasError::Unsupported { operation })
        }
    }

    async fn request<R: DeserializeOwned>(&self, envelope: &Envelope) -> Result<R, HafasError> {
        let method = envelope.method();
        debug!(method, profile = %self.profile.name, "Request");
        let body = self.transport.send(&self.profile, envelope).await?;
        let res = extract_result(body)?;
        serde_json::from_value(res).map_err(|e| HafasError::shape(format!("{method} result: {e}")))
    }

    async fn station_board(
        &self,
        kind: BoardType,
        station_id: &str,
        opts: &DeparturesOptions,
    ) -> Result<Vec<StationBoardEntry>, HafasError> {
        let when = opts.when.unwrap_or_else(|| self.now());
        let envelope = envelope::station_board(&self.profile, kind, station_id, opts, when)?;
        let res: RawJourneyListResult = self.request(&envelope).await?;
        let resolve = ResolveOptions {
            remarks: opts.remarks,
            polylines: false,
            station_lines: opts.station_lines,
        };
        convert::station_board(&self.profile, &res, kind, resolve, opts.stopovers)
    }

    /// Departures at a station, sorted by time.
    pub async fn departures(
        &self,
        station_id: &str,
        opts: &DeparturesOptions,
    ) -> Result<Vec<StationBoardEntry>, HafasError> {
        self.station_board(BoardType::Departures, station_id, opts)
            .await
    }

    /// Arrivals at a station, sorted by time. Entries carry no direction.
    pub async fn arrivals(
        &self,
        station_id: &str,
        opts: &ArrivalsOptions,
    ) -> Result<Vec<StationBoardEntry>, HafasError> {
        self.station_board(BoardType::Arrivals, station_id, opts)
            .await
    }

    /// Journeys from `from` to `to`.
    ///
    /// With `results` set, pages are fetched until that many journeys are
    /// collected. The returned `earlier_ref`/`later_ref` can be passed back
    /// as `earlier_than`/`later_than`.
    pub async fn journeys(
        &self,
        from: &Location,
        to: &Location,
        opts: JourneysOptions,
    ) -> Result<JourneyList, HafasError> {
        let query = opts.validate()?;
        let search = TripSearch::new(&self.profile, from, to, &query)?;
        let options = query.options();
        let pages = TripSearchPages {
            client: self,
            search,
            resolve: ResolveOptions {
                remarks: options.remarks,
                polylines: options.polylines,
                station_lines: false,
            },
            stopovers: options.stopovers,
        };

        let start = query.start();
        let when = start.time().unwrap_or_else(|| self.now());
        let cursor = start.cursor().map(str::to_string);
        pagination::collect(&pages, when, cursor, options.results).await
    }

    /// Re-fetches a journey by its refresh token.
    pub async fn refresh_journey(
        &self,
        refresh_token: &str,
        opts: &RefreshJourneyOptions,
    ) -> Result<Journey, HafasError> {
        self.require(self.profile.features.refresh_journey, "refresh_journey")?;
        let envelope = envelope::reconstruction(&self.profile, refresh_token, opts)?;
        let res: RawTripSearchResult = self.request(&envelope).await?;
        let resolve = ResolveOptions {
            remarks: opts.remarks,
            polylines: opts.polylines,
            station_lines: false,
        };
        convert::refreshed_journey(&self.profile, &res, resolve, opts.stopovers)
    }

    /// Free-text location search.
    pub async fn locations(
        &self,
        query: &str,
        opts: &LocationsOptions,
    ) -> Result<Vec<Arc<Location>>, HafasError> {
        let envelope = envelope::loc_match(&self.profile, query, opts)?;
        let res: RawLocMatchResult = self.request(&envelope).await?;
        let resolve = ResolveOptions {
            station_lines: opts.station_lines,
            ..ResolveOptions::default()
        };
        Ok(convert::locations(&self.profile, &res, resolve))
    }

    /// Details of one station.
    pub async fn station(
        &self,
        station_id: &str,
        opts: &StationOptions,
    ) -> Result<Arc<Location>, HafasError> {
        let envelope = envelope::loc_details(&self.profile, station_id)?;
        let res: RawLocationListResult = self.request(&envelope).await?;
        let resolve = ResolveOptions {
            station_lines: opts.station_lines,
            ..ResolveOptions::default()
        };
        convert::station(&self.profile, &res, resolve)
    }

    /// Stations and POIs around a coordinate, with their distance.
    pub async fn nearby(
        &self,
        center: Coordinate,
        opts: &NearbyOptions,
    ) -> Result<Vec<NearbyLocation>, HafasError> {
        let envelope = envelope::loc_geo_pos(&self.profile, center, opts)?;
        let res: RawLocationListResult = self.request(&envelope).await?;
        let resolve = ResolveOptions {
            station_lines: opts.station_lines,
            ..ResolveOptions::default()
        };
        Ok(convert::nearby(&self.profile, &res, resolve))
    }

    /// One trip as a leg from its first to its last stop.
    pub async fn trip(
        &self,
        trip_id: &str,
        line_name: &str,
        opts: &TripOptions,
    ) -> Result<TransitLeg, HafasError> {
        self.require(self.profile.features.trip, "trip")?;
        let envelope = envelope::journey_details(&self.profile, trip_id, line_name, opts)?;
        let res: RawJourneyDetailsResult = self.request(&envelope).await?;
        let resolve = ResolveOptions {
            remarks: opts.remarks,
            polylines: opts.polyline,
            station_lines: false,
        };
        convert::trip(&self.profile, &res, resolve, opts.stopovers)
    }

    /// Vehicles inside a bounding box, with their forecast movement.
    pub async fn radar(
        &self,
        bbox: &BoundingBox,
        opts: &RadarOptions,
    ) -> Result<Vec<Movement>, HafasError> {
        self.require(self.profile.features.radar, "radar")?;
        let when = opts.when.unwrap_or_else(|| self.now());
        let envelope = envelope::journey_geo_pos(&self.profile, bbox, opts, when)?;
        let res: RawJourneyListResult = self.request(&envelope).await?;
        let resolve = ResolveOptions {
            remarks: true,
            polylines: opts.polylines,
            station_lines: false,
        };
        convert::movements(&self.profile, &res, resolve, when)
    }

    /// Stations reachable from an address, grouped by travel time.
    ///
    /// Incomplete responses are retried according to the retry policy.
    pub async fn reachable_from(
        &self,
        origin: &Address,
        opts: &ReachableFromOptions,
    ) -> Result<Vec<ReachableGroup>, HafasError> {
        self.require(self.profile.features.reachable_from, "reachable_from")?;
        let when = opts.when.unwrap_or_else(|| self.now());
        let origin = Location::Address(origin.clone());
        let envelope = &envelope::loc_geo_reach(&self.profile, &origin, opts, when)?;

        self.retry
            .run(move || async move {
                let res: RawReachResult = self.request(envelope).await?;
                convert::reachable(&self.profile, &res)
            })
            .await
    }
}

/// Pages of one `journeys` call.
struct TripSearchPages<'a, T> {
    client: &'a HafasClient<T>,
    search: TripSearch,
    resolve: ResolveOptions,
    stopovers: bool,
}

impl<T: Transport> PageSource for TripSearchPages<'_, T> {
    async fn fetch(&self, when: Timestamp, cursor: Option<&str>) -> Result<JourneyPage, HafasError> {
        let profile = &self.client.profile;
        let envelope = self.search.page(profile, when, cursor);
        let res: RawTripSearchResult = self.client.request(&envelope).await?;
        convert::journey_page(profile, &res, self.resolve, self.stopovers)
    }
}
