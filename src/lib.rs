pub mod error;
pub mod fetch;
pub mod filter;
pub mod loader;
pub mod model;
pub mod output;
pub mod session;
pub mod summary;
pub mod traffic;

pub use error::TrafficError;
pub use filter::{
    TimeFilter, filter_trips_by_selector, filter_trips_by_time, minutes_since_midnight,
};
pub use model::{Station, StationId, Trip};
pub use session::{StationRenderer, TrafficFrame, TrafficSession, ViewEvent};
pub use traffic::{annotate_stations, compute_station_traffic};
