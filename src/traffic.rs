//! Per-station traffic aggregation.
//!
//! Counts are always derived from scratch: every pass groups the given trips
//! by start and end station and overwrites the derived fields of each station.

use std::collections::HashMap;

use crate::model::{Station, StationId, Trip};

/// Trip counts grouped by departure and arrival station.
#[derive(Debug, Default)]
pub struct TripRollup<'a> {
    departures: HashMap<&'a StationId, usize>,
    arrivals: HashMap<&'a StationId, usize>,
}

impl<'a> TripRollup<'a> {
    pub fn from_trips(trips: &'a [Trip]) -> Self {
        let mut rollup = TripRollup::default();

        for trip in trips {
            *rollup.departures.entry(&trip.start_station_id).or_default() += 1;
            *rollup.arrivals.entry(&trip.end_station_id).or_default() += 1;
        }

        rollup
    }

    pub fn departures(&self, id: &StationId) -> usize {
        self.departures.get(id).copied().unwrap_or(0)
    }

    pub fn arrivals(&self, id: &StationId) -> usize {
        self.arrivals.get(id).copied().unwrap_or(0)
    }

    /// Overwrites the derived traffic fields of `station`.
    pub fn apply(&self, station: &mut Station) {
        station.arrivals = self.arrivals(&station.short_name);
        station.departures = self.departures(&station.short_name);
        station.total_traffic = station.arrivals + station.departures;
    }
}

/// Annotates `stations` in place with the traffic of `trips` and returns them
/// for chaining.
///
/// Trips whose station ids match no station contribute nothing. Calling this
/// twice with the same trips yields the same counts.
pub fn compute_station_traffic<'s>(
    stations: &'s mut [Station],
    trips: &[Trip],
) -> &'s mut [Station] {
    let rollup = TripRollup::from_trips(trips);

    for station in stations.iter_mut() {
        rollup.apply(station);
    }

    stations
}

/// Returns a freshly annotated copy of `stations`, leaving the input untouched.
pub fn annotate_stations(stations: &[Station], trips: &[Trip]) -> Vec<Station> {
    let mut annotated = stations.to_vec();
    compute_station_traffic(&mut annotated, trips);
    annotated
}
