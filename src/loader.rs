//! Loading of trip logs and station documents.
//!
//! Sources are local paths or `http(s)` URLs; a `.gz` suffix marks gzip
//! content. Malformed records are reported here, the traffic core only sees
//! well-typed [`Trip`] and [`Station`] values.

use std::io::Read;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::fetch::{BasicClient, fetch_bytes};
use crate::model::{Station, Trip};
use crate::session::TrafficSession;

/// Public Bluebikes trip log for March 2024.
pub const DEFAULT_TRIPS_SOURCE: &str =
    "https://dsc106.com/labs/lab07/data/bluebikes-traffic-2024-03.csv";
/// Public Bluebikes station document.
pub const DEFAULT_STATIONS_SOURCE: &str =
    "https://dsc106.com/labs/lab07/data/bluebikes-stations.json";

/// Reads `source` from disk or over HTTP, inflating gzip content.
#[tracing::instrument(skip_all, fields(source = %source))]
pub async fn read_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        let client = BasicClient::new()?;
        fetch_bytes(&client, source).await?
    } else {
        std::fs::read(source).with_context(|| format!("failed to read {source}"))?
    };

    if source.ends_with(".gz") {
        let mut inflated = Vec::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_end(&mut inflated)
            .with_context(|| format!("failed to decompress {source}"))?;
        debug!(compressed = bytes.len(), inflated = inflated.len(), "Source decompressed");
        return Ok(inflated);
    }

    Ok(bytes)
}

/// Parses a trip log CSV. Columns other than the station ids and the
/// timestamps are ignored.
///
/// # Errors
///
/// Returns an error naming the first row that cannot be parsed.
pub fn parse_trips(bytes: &[u8]) -> Result<Vec<Trip>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(bytes);
    let mut trips = Vec::new();

    for (i, result) in rdr.deserialize().enumerate() {
        // header is line 1
        let trip: Trip = result.with_context(|| format!("invalid trip at line {}", i + 2))?;
        trips.push(trip);
    }

    Ok(trips)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StationDocument {
    Feed { data: StationData },
    List(Vec<Station>),
}

#[derive(Deserialize)]
struct StationData {
    stations: Vec<Station>,
}

/// Parses a station document, either `{"data": {"stations": [...]}}` or a
/// bare array.
pub fn parse_stations(bytes: &[u8]) -> Result<Vec<Station>> {
    let doc: StationDocument =
        serde_json::from_slice(bytes).context("invalid station document")?;

    Ok(match doc {
        StationDocument::Feed { data } => data.stations,
        StationDocument::List(stations) => stations,
    })
}

pub async fn load_trips(source: &str) -> Result<Vec<Trip>> {
    let bytes = read_source(source).await?;
    let trips = parse_trips(&bytes).with_context(|| format!("failed to load trips from {source}"))?;
    info!(source, trips = trips.len(), "Trips loaded");
    Ok(trips)
}

pub async fn load_stations(source: &str) -> Result<Vec<Station>> {
    let bytes = read_source(source).await?;
    let stations =
        parse_stations(&bytes).with_context(|| format!("failed to load stations from {source}"))?;
    info!(source, stations = stations.len(), "Stations loaded");
    Ok(stations)
}

/// Loads both sources into a session. A source that fails to load is logged
/// and leaves an empty session behind instead of aborting.
pub async fn load_session(trips_source: &str, stations_source: &str) -> TrafficSession {
    let stations = match load_stations(stations_source).await {
        Ok(stations) => stations,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Station data failed to load");
            return TrafficSession::empty();
        }
    };

    let trips = match load_trips(trips_source).await {
        Ok(trips) => trips,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Trip data failed to load");
            return TrafficSession::empty();
        }
    };

    TrafficSession::new(stations, trips)
}
