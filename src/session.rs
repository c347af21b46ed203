//! Recomputation driven by view events.
//!
//! A [`TrafficSession`] owns the trips and stations as loaded. Every filter
//! change filters the original trips and annotates a fresh copy of the
//! original stations, so no frame depends on the one before it.

use anyhow::Result;
use tracing::{debug, info};

use crate::filter::{TimeFilter, filter_trips_by_time};
use crate::model::{Station, Trip};
use crate::traffic::annotate_stations;

/// Read-only view of one recompute, handed to a [`StationRenderer`].
#[derive(Debug, Clone, Copy)]
pub struct TrafficFrame<'a> {
    pub filter: TimeFilter,
    pub stations: &'a [Station],
    pub active_trips: usize,
}

impl TrafficFrame<'_> {
    /// Upper bound of the marker size domain.
    pub fn max_total_traffic(&self) -> usize {
        self.stations
            .iter()
            .map(|s| s.total_traffic)
            .max()
            .unwrap_or(0)
    }
}

/// Consumer of annotated stations, e.g. a map layer.
pub trait StationRenderer {
    fn render(&mut self, frame: &TrafficFrame<'_>) -> Result<()>;
}

/// Inputs the session reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    /// Raw slider value, `-1` for any time.
    TimeFilterChanged(i32),
    /// Pan, zoom or resize; positions move, traffic does not.
    ViewportChanged,
}

#[derive(Debug, Default)]
pub struct TrafficSession {
    trips: Vec<Trip>,
    stations: Vec<Station>,
    filter: TimeFilter,
    annotated: Vec<Station>,
    active_trips: usize,
}

impl TrafficSession {
    pub fn new(stations: Vec<Station>, trips: Vec<Trip>) -> Self {
        let mut session = TrafficSession {
            trips,
            stations,
            ..Default::default()
        };
        session.recompute(TimeFilter::Any);
        session
    }

    /// Session with no data, used when loading failed. It still accepts
    /// events and renders empty frames.
    pub fn empty() -> Self {
        TrafficSession::default()
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    /// Stations as loaded, never annotated.
    pub fn source_stations(&self) -> &[Station] {
        &self.stations
    }

    /// Stations annotated for the current filter.
    pub fn stations(&self) -> &[Station] {
        &self.annotated
    }

    pub fn filter(&self) -> TimeFilter {
        self.filter
    }

    pub fn active_trips(&self) -> usize {
        self.active_trips
    }

    pub fn frame(&self) -> TrafficFrame<'_> {
        TrafficFrame {
            filter: self.filter,
            stations: &self.annotated,
            active_trips: self.active_trips,
        }
    }

    pub fn max_total_traffic(&self) -> usize {
        self.frame().max_total_traffic()
    }

    /// Rebuilds the current frame from the original trips and stations.
    #[tracing::instrument(skip_all, fields(filter = %filter))]
    pub fn recompute(&mut self, filter: TimeFilter) -> &[Station] {
        let active = filter_trips_by_time(&self.trips, filter);

        self.active_trips = active.len();
        self.annotated = annotate_stations(&self.stations, &active);
        self.filter = filter;

        debug!(
            active_trips = self.active_trips,
            total_trips = self.trips.len(),
            stations = self.annotated.len(),
            "Station traffic recomputed"
        );

        &self.annotated
    }

    /// Applies one event and renders the resulting frame.
    ///
    /// # Errors
    ///
    /// Fails on an out-of-range slider value, leaving the current frame in
    /// place, or when the renderer fails.
    pub fn handle<R: StationRenderer>(
        &mut self,
        event: ViewEvent,
        renderer: &mut R,
    ) -> Result<()> {
        if let ViewEvent::TimeFilterChanged(selector) = event {
            let filter = TimeFilter::try_from(selector)?;
            self.recompute(filter);
        }

        renderer.render(&self.frame())
    }

    /// Applies a burst of events in order, collapsing each run of filter
    /// changes to its last value and each run of viewport changes to one
    /// render. Returns the number of frames rendered.
    ///
    /// # Errors
    ///
    /// An out-of-range slider value stops the burst. Events before it are
    /// applied first, so the session ends where handling them one by one
    /// would leave it.
    pub fn dispatch<R, I>(&mut self, events: I, renderer: &mut R) -> Result<usize>
    where
        R: StationRenderer,
        I: IntoIterator<Item = ViewEvent>,
    {
        let mut rendered = 0;
        let mut pending: Option<ViewEvent> = None;

        for event in events {
            if let ViewEvent::TimeFilterChanged(selector) = event {
                if let Err(e) = TimeFilter::try_from(selector) {
                    if let Some(previous) = pending.take() {
                        self.handle(previous, renderer)?;
                    }
                    return Err(e.into());
                }
            }

            let coalesces = matches!(
                (pending, event),
                (Some(ViewEvent::TimeFilterChanged(_)), ViewEvent::TimeFilterChanged(_))
                    | (Some(ViewEvent::ViewportChanged), ViewEvent::ViewportChanged)
            );

            if !coalesces {
                if let Some(previous) = pending {
                    self.handle(previous, renderer)?;
                    rendered += 1;
                }
            }
            pending = Some(event);
        }

        if let Some(last) = pending {
            self.handle(last, renderer)?;
            rendered += 1;
        }

        info!(rendered, filter = %self.filter, "Event burst applied");
        Ok(rendered)
    }
}
