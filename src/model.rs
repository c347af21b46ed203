//! Trip and station records shared by the loader, the aggregator and the
//! rendering boundary.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Station short code, the only key joining trips to stations.
///
/// Backed by `Arc<str>` so filtered trip copies share their ids.
#[derive(Clone, Debug)]
pub struct StationId(Arc<str>);

impl StationId {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for StationId {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for StationId {}

impl Hash for StationId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StationId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StationId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl Serialize for StationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

/// One bike rental, read-only once loaded.
///
/// Timestamps are local wall-clock times; the trip log carries no zone.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Trip {
    pub start_station_id: StationId,
    pub end_station_id: StationId,
    #[serde(deserialize_with = "deserialize_local_time")]
    pub started_at: NaiveDateTime,
    #[serde(deserialize_with = "deserialize_local_time")]
    pub ended_at: NaiveDateTime,
}

impl Trip {
    pub fn new(
        start_station_id: impl Into<StationId>,
        end_station_id: impl Into<StationId>,
        started_at: NaiveDateTime,
        ended_at: NaiveDateTime,
    ) -> Self {
        Self {
            start_station_id: start_station_id.into(),
            end_station_id: end_station_id.into(),
            started_at,
            ended_at,
        }
    }
}

const LOCAL_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parses a trip timestamp into its wall-clock reading.
///
/// Offset-qualified RFC 3339 values keep the clock time of their own offset.
pub fn parse_local_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    LOCAL_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

fn deserialize_local_time<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_local_time(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {raw:?}")))
}

/// A dock location plus the traffic derived for it by the last aggregation.
///
/// `arrivals`, `departures` and `total_traffic` are outputs of the
/// aggregator and are overwritten on every pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub short_name: StationId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub lon: f64,
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub lat: f64,
    #[serde(default)]
    pub arrivals: usize,
    #[serde(default)]
    pub departures: usize,
    #[serde(default)]
    pub total_traffic: usize,
}

impl Station {
    pub fn new(short_name: impl Into<StationId>, lon: f64, lat: f64) -> Self {
        Self {
            short_name: short_name.into(),
            name: None,
            lon,
            lat,
            arrivals: 0,
            departures: 0,
            total_traffic: 0,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Share of traffic that leaves the station, `None` for an idle station.
    pub fn departure_ratio(&self) -> Option<f64> {
        if self.total_traffic == 0 {
            None
        } else {
            Some(self.departures as f64 / self.total_traffic as f64)
        }
    }

    /// Marker label, e.g. `"12 trips (5 departures, 7 arrivals)"`.
    pub fn tooltip(&self) -> String {
        format!(
            "{} trips ({} departures, {} arrivals)",
            self.total_traffic, self.departures, self.arrivals
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

fn deserialize_coordinate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Coordinate::deserialize(deserializer)? {
        Coordinate::Number(n) => Ok(n),
        Coordinate::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid coordinate: {s:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_station_id_equality_ignores_allocation() {
        let a = StationId::new("A32000");
        let b = StationId::from(String::from("A32000"));
        assert_eq!(a, b);
        assert_eq!(a.clone(), a);
        assert_ne!(a, StationId::from("B32000"));
    }

    #[test]
    fn test_parse_local_time_formats() {
        assert_eq!(parse_local_time("2024-03-01 08:20:00"), Some(at(8, 20)));
        assert_eq!(
            parse_local_time("2024-03-01 08:20:00.123"),
            Some(at(8, 20) + chrono::Duration::milliseconds(123))
        );
        assert_eq!(parse_local_time("2024-03-01T08:20:00"), Some(at(8, 20)));
        assert_eq!(parse_local_time("2024-03-01T08:20:00-05:00"), Some(at(8, 20)));
        assert_eq!(parse_local_time("yesterday"), None);
    }

    #[test]
    fn test_departure_ratio_idle_station() {
        let station = Station::new("A", -71.0, 42.0);
        assert_eq!(station.departure_ratio(), None);
    }

    #[test]
    fn test_departure_ratio_and_tooltip() {
        let mut station = Station::new("A", -71.0, 42.0);
        station.arrivals = 3;
        station.departures = 1;
        station.total_traffic = 4;

        assert_eq!(station.departure_ratio(), Some(0.25));
        assert_eq!(station.tooltip(), "4 trips (1 departures, 3 arrivals)");
    }

    #[test]
    fn test_station_deserializes_string_coordinates() {
        let station: Station = serde_json::from_str(
            r#"{"short_name":"A32000","name":"Fan Pier","lon":"-71.04","lat":42.35,"capacity":15}"#,
        )
        .unwrap();

        assert_eq!(station.short_name.as_str(), "A32000");
        assert_eq!(station.name.as_deref(), Some("Fan Pier"));
        assert_eq!(station.lon, -71.04);
        assert_eq!(station.lat, 42.35);
        assert_eq!(station.total_traffic, 0);
    }
}
