//! Time-of-day window over the trip log.

use std::borrow::Cow;
use std::fmt;

use chrono::{NaiveDateTime, NaiveTime, Timelike};

use crate::error::TrafficError;
use crate::model::Trip;

/// Slider position: every trip, or a minute of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFilter {
    #[default]
    Any,
    Minute(u16),
}

impl TimeFilter {
    /// Sentinel the slider reports for "any time".
    pub const ANY_SENTINEL: i32 = -1;
    pub const MAX_MINUTE: u16 = 1439;
    /// Half-width of the window around the selected minute.
    pub const WINDOW_MINUTES: u16 = 60;

    pub fn is_any(&self) -> bool {
        matches!(self, TimeFilter::Any)
    }

    /// Raw slider value, `-1` for [`TimeFilter::Any`].
    pub fn as_selector(&self) -> i32 {
        match self {
            TimeFilter::Any => Self::ANY_SENTINEL,
            TimeFilter::Minute(m) => i32::from(*m),
        }
    }

    /// Whether `trip` starts or ends within the window.
    ///
    /// The distance is plain minute-of-day difference, so 23:59 is 1409
    /// minutes from 00:30, not 31.
    pub fn matches(&self, trip: &Trip) -> bool {
        match self {
            TimeFilter::Any => true,
            TimeFilter::Minute(selected) => {
                let near = |t: &NaiveDateTime| {
                    minutes_since_midnight(t).abs_diff(*selected) <= Self::WINDOW_MINUTES
                };
                near(&trip.started_at) || near(&trip.ended_at)
            }
        }
    }
}

impl TryFrom<i32> for TimeFilter {
    type Error = TrafficError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        const MAX: i32 = TimeFilter::MAX_MINUTE as i32;

        match value {
            Self::ANY_SENTINEL => Ok(TimeFilter::Any),
            0..=MAX => Ok(TimeFilter::Minute(value as u16)),
            _ => Err(TrafficError::InvalidTimeFilter(value)),
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeFilter::Any => write!(f, "any time"),
            TimeFilter::Minute(m) => {
                match NaiveTime::from_num_seconds_from_midnight_opt(u32::from(*m) * 60, 0) {
                    Some(t) => write!(f, "{}", t.format("%-I:%M %p")),
                    None => write!(f, "minute {m}"),
                }
            }
        }
    }
}

/// `hour * 60 + minute` of the wall-clock time, ignoring date and seconds.
pub fn minutes_since_midnight(t: &NaiveDateTime) -> u16 {
    (t.hour() * 60 + t.minute()) as u16
}

/// Trips active under `filter`, in their original order.
///
/// [`TimeFilter::Any`] borrows the input unchanged.
pub fn filter_trips_by_time(trips: &[Trip], filter: TimeFilter) -> Cow<'_, [Trip]> {
    if filter.is_any() {
        return Cow::Borrowed(trips);
    }

    Cow::Owned(
        trips
            .iter()
            .filter(|trip| filter.matches(trip))
            .cloned()
            .collect(),
    )
}

/// [`filter_trips_by_time`] for a raw slider value.
///
/// # Errors
///
/// Returns [`TrafficError::InvalidTimeFilter`] for anything other than `-1`
/// or a minute in `0..=1439`.
pub fn filter_trips_by_selector(
    trips: &[Trip],
    selector: i32,
) -> Result<Cow<'_, [Trip]>, TrafficError> {
    let filter = TimeFilter::try_from(selector)?;
    Ok(filter_trips_by_time(trips, filter))
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

    fn trip(start: NaiveDateTime, end: NaiveDateTime) -> Trip {
        Trip::new("A", "B", start, end)
    }

    #[test]
    fn test_any_is_passthrough() {
        let trips = vec![trip(at(8, 0), at(8, 20)), trip(at(23, 0), at(23, 30))];
        let filtered = filter_trips_by_time(&trips, TimeFilter::Any);

        assert!(matches!(filtered, Cow::Borrowed(_)));
        assert_eq!(filtered.as_ref(), trips.as_slice());
    }

    #[test]
    fn test_start_within_window() {
        let trips = vec![trip(at(8, 0), at(8, 5))];

        assert_eq!(filter_trips_by_time(&trips, TimeFilter::Minute(480)).len(), 1);
        assert_eq!(filter_trips_by_time(&trips, TimeFilter::Minute(600)).len(), 0);
    }

    #[test]
    fn test_window_edges_inclusive() {
        let trips = vec![trip(at(8, 0), at(8, 0))];

        assert_eq!(filter_trips_by_time(&trips, TimeFilter::Minute(540)).len(), 1);
        assert_eq!(filter_trips_by_time(&trips, TimeFilter::Minute(420)).len(), 1);
        assert_eq!(filter_trips_by_time(&trips, TimeFilter::Minute(541)).len(), 0);
        assert_eq!(filter_trips_by_time(&trips, TimeFilter::Minute(419)).len(), 0);
    }

    #[test]
    fn test_end_time_alone_qualifies() {
        let trips = vec![trip(at(6, 0), at(9, 50))];

        assert_eq!(filter_trips_by_time(&trips, TimeFilter::Minute(600)).len(), 1);
    }

    #[test]
    fn test_no_midnight_wrap() {
        let trips = vec![trip(at(23, 59), at(23, 59))];

        assert_eq!(filter_trips_by_time(&trips, TimeFilter::Minute(30)).len(), 0);
        assert_eq!(filter_trips_by_time(&trips, TimeFilter::Minute(1439)).len(), 1);
    }

    #[test]
    fn test_seconds_and_date_ignored() {
        let late = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(9, 0, 59)
            .unwrap();
        let trips = vec![trip(late, late)];

        assert_eq!(minutes_since_midnight(&late), 540);
        assert_eq!(filter_trips_by_time(&trips, TimeFilter::Minute(600)).len(), 1);
    }

    #[test]
    fn test_order_preserved() {
        let trips = vec![
            Trip::new("1", "x", at(8, 0), at(8, 10)),
            Trip::new("2", "x", at(12, 0), at(12, 10)),
            Trip::new("3", "x", at(8, 30), at(8, 40)),
            Trip::new("4", "x", at(7, 45), at(7, 50)),
        ];
        let filtered = filter_trips_by_time(&trips, TimeFilter::Minute(480));

        let ids: Vec<_> = filtered.iter().map(|t| t.start_station_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
        assert_eq!(trips.len(), 4);
    }

    #[test]
    fn test_selector_range() {
        assert_eq!(TimeFilter::try_from(-1), Ok(TimeFilter::Any));
        assert_eq!(TimeFilter::try_from(0), Ok(TimeFilter::Minute(0)));
        assert_eq!(TimeFilter::try_from(1439), Ok(TimeFilter::Minute(1439)));
        assert_eq!(TimeFilter::try_from(1440), Err(TrafficError::InvalidTimeFilter(1440)));
        assert_eq!(TimeFilter::try_from(-2), Err(TrafficError::InvalidTimeFilter(-2)));
        assert_eq!(TimeFilter::Minute(75).as_selector(), 75);
        assert_eq!(TimeFilter::Any.as_selector(), -1);
    }

    #[test]
    fn test_filter_by_selector() {
        let trips = vec![trip(at(8, 0), at(8, 20))];

        assert_eq!(filter_trips_by_selector(&trips, -1).unwrap().len(), 1);
        assert_eq!(filter_trips_by_selector(&trips, 480).unwrap().len(), 1);
        assert!(filter_trips_by_selector(&trips, 5000).is_err());
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(TimeFilter::Any.to_string(), "any time");
        assert_eq!(TimeFilter::Minute(0).to_string(), "12:00 AM");
        assert_eq!(TimeFilter::Minute(480).to_string(), "8:00 AM");
        assert_eq!(TimeFilter::Minute(1439).to_string(), "11:59 PM");
    }
}
