use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hafas_client::domain::{Address, Coordinate, Location, Stop, Timestamp};
use hafas_client::hafas::options::{
    BoundingBox, DeparturesOptions, JourneysOptions, LocationsOptions, NearbyOptions,
    RadarOptions, ReachableFromOptions, RefreshJourneyOptions, StationOptions, TripOptions,
    parse_when,
};
use hafas_client::hafas::{
    ClientConfig, FixtureTransport, HafasClient, HafasError, HttpTransport, Transport,
    TransportError,
};
use hafas_client::profile::{self, PROFILE_NAMES, Profile};

/// Query a HAFAS public transport backend and print the result as JSON
#[derive(Parser, Debug)]
#[command(name = "hafas-client", version, about)]
struct Cli {
    /// Backend deployment (vbb, cfl, invg)
    #[arg(value_parser = parse_profile)]
    profile: Profile,

    /// User agent sent with every request
    #[arg(long, env = "HAFAS_USER_AGENT")]
    user_agent: Option<String>,

    /// Directory of recorded responses to serve instead of the endpoint
    #[arg(long, env = "HAFAS_FIXTURES")]
    fixtures: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Departures at a station
    Departures {
        station_id: String,
        /// RFC 3339 time, defaults to now
        #[arg(value_parser = parse_when)]
        when: Option<Timestamp>,
    },

    /// Arrivals at a station
    Arrivals {
        station_id: String,
        /// RFC 3339 time, defaults to now
        #[arg(value_parser = parse_when)]
        when: Option<Timestamp>,
    },

    /// Journeys between two stations
    Journeys {
        from: String,
        to: String,
        /// Minimum number of journeys to collect
        results: Option<usize>,
    },

    /// Refresh a journey by its refresh token
    Refresh { token: String },

    /// Search stations, addresses and points of interest
    Locations { query: String },

    /// Details of one station
    Station { station_id: String },

    /// Stations near a coordinate
    Nearby {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
    },

    /// Stopovers of one trip
    Trip { trip_id: String, line_name: String },

    /// Vehicle positions within a bounding box
    Radar {
        #[arg(allow_negative_numbers = true)]
        north: f64,
        #[arg(allow_negative_numbers = true)]
        west: f64,
        #[arg(allow_negative_numbers = true)]
        south: f64,
        #[arg(allow_negative_numbers = true)]
        east: f64,
    },

    /// Stations reachable from an address, grouped by travel time
    Reachable {
        address: String,
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Hafas(#[from] HafasError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to print result: {0}")]
    Json(#[from] serde_json::Error),
}

fn parse_profile(name: &str) -> Result<Profile, String> {
    profile::by_name(name).ok_or_else(|| format!("expected one of {}", PROFILE_NAMES.join(", ")))
}

fn station(id: &str) -> Result<Location, HafasError> {
    Ok(Location::Stop(Stop::new(id, "")?))
}

fn print(value: &impl Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum BoardKind {
    Departures,
    Arrivals,
}

async fn board<T: Transport>(
    client: &HafasClient<T>,
    station_id: &str,
    when: Option<Timestamp>,
    kind: BoardKind,
) -> Result<(), CliError> {
    let mut opts = DeparturesOptions::default();
    if let Some(when) = when {
        opts = opts.with_when(when);
    }
    let board = match kind {
        BoardKind::Departures => client.departures(station_id, &opts).await?,
        BoardKind::Arrivals => client.arrivals(station_id, &opts).await?,
    };
    let delayed = board.iter().filter(|e| e.event.is_delayed()).count();
    info!(entries = board.len(), delayed, "Station board");
    print(&board)
}

async fn run<T: Transport>(client: HafasClient<T>, command: Command) -> Result<(), CliError> {
    match command {
        Command::Departures { station_id, when } => {
            board(&client, &station_id, when, BoardKind::Departures).await
        }
        Command::Arrivals { station_id, when } => {
            board(&client, &station_id, when, BoardKind::Arrivals).await
        }
        Command::Journeys { from, to, results } => {
            let mut opts = JourneysOptions::default();
            if let Some(results) = results {
                opts = opts.with_results(results);
            }
            let list = client.journeys(&station(&from)?, &station(&to)?, opts).await?;
            for journey in list.iter() {
                info!(
                    departure = ?journey.departure_time(),
                    minutes = journey.duration().map(|d| d.num_minutes()),
                    changes = journey.change_count(),
                    "Journey"
                );
            }
            print(&list)
        }
        Command::Refresh { token } => print(
            &client
                .refresh_journey(&token, &RefreshJourneyOptions::default())
                .await?,
        ),
        Command::Locations { query } => {
            print(&client.locations(&query, &LocationsOptions::default()).await?)
        }
        Command::Station { station_id } => print(
            &client
                .station(&station_id, &StationOptions::default())
                .await?,
        ),
        Command::Nearby {
            latitude,
            longitude,
        } => {
            let center = Coordinate::new(latitude, longitude).map_err(HafasError::from)?;
            print(&client.nearby(center, &NearbyOptions::default()).await?)
        }
        Command::Trip { trip_id, line_name } => print(
            &client
                .trip(&trip_id, &line_name, &TripOptions::default())
                .await?,
        ),
        Command::Radar {
            north,
            west,
            south,
            east,
        } => {
            let bbox = BoundingBox::new(north, west, south, east)?;
            print(&client.radar(&bbox, &RadarOptions::default()).await?)
        }
        Command::Reachable {
            address,
            latitude,
            longitude,
        } => {
            let origin = Address {
                address,
                coordinate: Coordinate::new(latitude, longitude).map_err(HafasError::from)?,
            };
            print(
                &client
                    .reachable_from(&origin, &ReachableFromOptions::default())
                    .await?,
            )
        }
    }
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let profile = cli.profile;

    if let Some(dir) = cli.fixtures {
        info!(dir = %dir.display(), "Serving recorded responses");
        let client = HafasClient::new(profile, FixtureTransport::new(&dir)?);
        return run(client, cli.command).await;
    }

    let mut config = ClientConfig::new();
    if let Some(user_agent) = cli.user_agent {
        config = config.with_user_agent(user_agent);
    }
    info!(profile = %profile.name, endpoint = %profile.endpoint, "Querying");
    let client = HafasClient::new(profile, HttpTransport::new(config)?);
    run(client, cli.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hafas_client=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_departures_with_time() {
        let cli = Cli::try_parse_from([
            "hafas-client",
            "vbb",
            "departures",
            "900000100003",
            "2024-03-15T10:00:00+01:00",
        ])
        .unwrap();
        assert_eq!(cli.profile.name, "vbb");
        match cli.command {
            Command::Departures { station_id, when } => {
                assert_eq!(station_id, "900000100003");
                assert_eq!(when.unwrap().to_rfc3339(), "2024-03-15T10:00:00+01:00");
            }
            other => panic!("expected departures, got {other:?}"),
        }
    }

    #[test]
    fn negative_coordinates_are_numbers() {
        let cli = Cli::try_parse_from(["hafas-client", "cfl", "nearby", "49.6", "-6.13"]).unwrap();
        match cli.command {
            Command::Nearby {
                latitude,
                longitude,
            } => {
                assert_eq!(latitude, 49.6);
                assert_eq!(longitude, -6.13);
            }
            other => panic!("expected nearby, got {other:?}"),
        }
    }

    #[test]
    fn journeys_result_count_is_optional() {
        let cli = Cli::try_parse_from(["hafas-client", "invg", "journeys", "1", "2", "5"]).unwrap();
        assert!(matches!(cli.command, Command::Journeys { results: Some(5), .. }));

        let cli = Cli::try_parse_from(["hafas-client", "invg", "journeys", "1", "2"]).unwrap();
        assert!(matches!(cli.command, Command::Journeys { results: None, .. }));
    }

    #[test]
    fn rejects_unknown_profile_and_bad_numbers() {
        let err = Cli::try_parse_from(["hafas-client", "nope", "station", "1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);

        let err = Cli::try_parse_from(["hafas-client", "vbb", "nearby", "north", "13.4"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);

        let err = Cli::try_parse_from(["hafas-client", "vbb", "departures", "1", "yesterday"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }
}
