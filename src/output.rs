//! Output sinks for annotated stations and traffic summaries.
//!
//! Supports pretty JSON logging, CSV snapshots of a frame, CSV append of
//! summary rows, and two [`StationRenderer`]s built on them.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::model::Station;
use crate::session::{StationRenderer, TrafficFrame};
use crate::summary::TrafficSummary;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes `stations` to a CSV file, replacing any previous content.
pub fn write_stations(path: &str, stations: &[Station]) -> Result<()> {
    debug!(path, stations = stations.len(), "Writing station CSV");

    let mut writer = WriterBuilder::new().from_path(path)?;
    for station in stations {
        writer.serialize(station)?;
    }
    writer.flush()?;

    Ok(())
}

/// Appends a [`TrafficSummary`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, summary: &TrafficSummary) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(summary)?;
    writer.flush()?;

    Ok(())
}

/// Logs every frame: one info line per frame, one debug line per station.
#[derive(Debug, Default)]
pub struct LogRenderer {
    pub frames: usize,
}

impl StationRenderer for LogRenderer {
    fn render(&mut self, frame: &TrafficFrame<'_>) -> Result<()> {
        self.frames += 1;

        for station in frame.stations {
            debug!(
                station = %station.short_name,
                lon = station.lon,
                lat = station.lat,
                departure_ratio = station.departure_ratio(),
                "{}",
                station.tooltip()
            );
        }

        info!(
            time = %frame.filter,
            stations = frame.stations.len(),
            active_trips = frame.active_trips,
            max_total_traffic = frame.max_total_traffic(),
            "Frame rendered"
        );
        Ok(())
    }
}

/// Rewrites a station CSV on every frame, so the file always holds the
/// latest traffic.
pub struct CsvRenderer {
    path: String,
}

impl CsvRenderer {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl StationRenderer for CsvRenderer {
    fn render(&mut self, frame: &TrafficFrame<'_>) -> Result<()> {
        write_stations(&self.path, frame.stations)
    }
}
