use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::filter::TimeFilter;
use crate::model::Station;
use crate::session::TrafficSession;

/// One row describing the traffic of a single time window.
#[derive(Debug, Default, Clone, Serialize)]
pub struct TrafficSummary {
    pub generated_at: DateTime<Utc>,
    pub time_filter: i32,
    pub time_label: String,

    pub stations: usize,
    pub total_trips: usize,
    pub active_trips: usize,

    // trip endpoints that landed on a known station
    pub matched_departures: usize,
    pub matched_arrivals: usize,
    pub unmatched_endpoints: usize,

    pub idle_stations: usize,
    pub busiest_station: Option<String>,
    pub max_total_traffic: usize,
    pub mean_total_traffic: f64,
    pub stddev_total_traffic: f64,
}

impl TrafficSummary {
    /// Summarizes an annotated station list produced from `active_trips` of
    /// `total_trips` trips.
    pub fn from_stations(
        filter: TimeFilter,
        total_trips: usize,
        active_trips: usize,
        stations: &[Station],
    ) -> Self {
        let mut s = TrafficSummary {
            generated_at: Utc::now(),
            time_filter: filter.as_selector(),
            time_label: filter.to_string(),
            stations: stations.len(),
            total_trips,
            active_trips,
            ..Default::default()
        };

        let mut busiest: Option<&Station> = None;
        let mut totals = Vec::with_capacity(stations.len());

        for station in stations {
            s.matched_departures += station.departures;
            s.matched_arrivals += station.arrivals;

            if station.total_traffic == 0 {
                s.idle_stations += 1;
            }

            if busiest.is_none_or(|b| station.total_traffic > b.total_traffic) {
                busiest = Some(station);
            }

            totals.push(station.total_traffic as f64);
        }

        // every active trip has two endpoints
        s.unmatched_endpoints =
            (active_trips * 2).saturating_sub(s.matched_departures + s.matched_arrivals);

        if let Some(b) = busiest.filter(|b| b.total_traffic > 0) {
            s.busiest_station = Some(b.short_name.to_string());
            s.max_total_traffic = b.total_traffic;
        }

        s.mean_total_traffic = mean(&totals);
        s.stddev_total_traffic = stddev(&totals, s.mean_total_traffic);

        s
    }

    /// Summarizes the session's current frame.
    pub fn from_session(session: &TrafficSession) -> Self {
        Self::from_stations(
            session.filter(),
            session.trips().len(),
            session.active_trips(),
            session.stations(),
        )
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Share of all trips that fall into this window.
    pub fn active_pct(&self) -> f64 {
        Self::pct(self.active_trips, self.total_trips)
    }
}

/// Arithmetic mean, 0.0 for empty input.
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation around a pre-computed mean.
fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: &str, arrivals: usize, departures: usize) -> Station {
        let mut s = Station::new(id, -71.0, 42.0);
        s.arrivals = arrivals;
        s.departures = departures;
        s.total_traffic = arrivals + departures;
        s
    }

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(TrafficSummary::pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(TrafficSummary::pct(50, 100), 50.0);
        assert_eq!(TrafficSummary::pct(1, 4), 25.0);
    }

    #[test]
    fn test_summary_empty() {
        let summary = TrafficSummary::from_stations(TimeFilter::Any, 0, 0, &[]);

        assert_eq!(summary.stations, 0);
        assert_eq!(summary.busiest_station, None);
        assert_eq!(summary.mean_total_traffic, 0.0);
        assert_eq!(summary.time_filter, -1);
        assert_eq!(summary.time_label, "any time");
    }

    #[test]
    fn test_summary_counts() {
        let stations = vec![station("A", 1, 3), station("B", 3, 1), station("C", 0, 0)];
        let summary = TrafficSummary::from_stations(TimeFilter::Minute(480), 10, 5, &stations);

        assert_eq!(summary.stations, 3);
        assert_eq!(summary.matched_departures, 4);
        assert_eq!(summary.matched_arrivals, 4);
        assert_eq!(summary.unmatched_endpoints, 2);
        assert_eq!(summary.idle_stations, 1);
        assert_eq!(summary.busiest_station.as_deref(), Some("A"));
        assert_eq!(summary.max_total_traffic, 4);
        assert!((summary.mean_total_traffic - 8.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.active_pct(), 50.0);
        assert_eq!(summary.time_label, "8:00 AM");
    }

    #[test]
    fn test_summary_from_session() {
        use chrono::NaiveDate;
        use crate::model::Trip;

        let t = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let mut session = TrafficSession::new(
            vec![Station::new("A", -71.0, 42.0), Station::new("B", -71.1, 42.1)],
            vec![Trip::new("A", "B", t, t), Trip::new("A", "Q", t, t)],
        );
        session.recompute(TimeFilter::Minute(1200));

        let summary = TrafficSummary::from_session(&session);
        assert_eq!(summary.total_trips, 2);
        assert_eq!(summary.active_trips, 0);
        assert_eq!(summary.idle_stations, 2);
        assert_eq!(summary.busiest_station, None);

        session.recompute(TimeFilter::Any);
        let summary = TrafficSummary::from_session(&session);
        assert_eq!(summary.unmatched_endpoints, 1);
        assert_eq!(summary.busiest_station.as_deref(), Some("A"));
    }

    #[test]
    fn test_stddev_uniform() {
        let values = [2.0, 2.0, 2.0];
        assert_eq!(stddev(&values, mean(&values)), 0.0);
    }

    #[test]
    fn test_stddev_spread() {
        let values = [1.0, 3.0];
        assert_eq!(stddev(&values, mean(&values)), 1.0);
    }
}
