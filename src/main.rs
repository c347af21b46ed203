//! CLI entry point for the bike-share traffic tool.
//!
//! Loads a trip log and a station document, then reports per-station
//! traffic for one time-of-day window or for a sweep across the day.

use anyhow::Result;
use bikeshare_traffic::loader::{DEFAULT_STATIONS_SOURCE, DEFAULT_TRIPS_SOURCE, load_session};
use bikeshare_traffic::output::{CsvRenderer, LogRenderer, append_record, print_json};
use bikeshare_traffic::session::{TrafficSession, ViewEvent};
use bikeshare_traffic::summary::TrafficSummary;
use bikeshare_traffic::TimeFilter;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bikeshare_traffic")]
#[command(about = "Per-station bike-share traffic by time of day", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Sources {
    /// Trip log CSV (path or URL, `.gz` allowed) [env: BIKESHARE_TRIPS_SOURCE]
    #[arg(long)]
    trips: Option<String>,

    /// Station JSON document (path or URL) [env: BIKESHARE_STATIONS_SOURCE]
    #[arg(long)]
    stations: Option<String>,
}

impl Sources {
    fn resolve(self) -> (String, String) {
        let trips = self
            .trips
            .or_else(|| std::env::var("BIKESHARE_TRIPS_SOURCE").ok())
            .unwrap_or_else(|| DEFAULT_TRIPS_SOURCE.to_string());
        let stations = self
            .stations
            .or_else(|| std::env::var("BIKESHARE_STATIONS_SOURCE").ok())
            .unwrap_or_else(|| DEFAULT_STATIONS_SOURCE.to_string());
        (trips, stations)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Station traffic for a single time window
    Traffic {
        #[command(flatten)]
        sources: Sources,

        /// Minute of the day (0-1439), or -1 for any time
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        time: i32,

        /// Optional: CSV file to write the annotated stations to
        #[arg(short, long)]
        output: Option<String>,

        /// Log the annotated stations as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Drag the time filter across the day and summarize every window
    Sweep {
        #[command(flatten)]
        sources: Sources,

        /// Minutes between slider positions
        #[arg(short, long, default_value_t = 60)]
        step: u16,

        /// Optional: CSV file to append one summary row per window to
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/bikeshare_traffic.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_traffic.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Traffic {
            sources,
            time,
            output,
            json,
        } => {
            let (trips, stations) = sources.resolve();
            let mut session = load_session(&trips, &stations).await;

            session.handle(ViewEvent::TimeFilterChanged(time), &mut LogRenderer::default())?;

            if let Some(path) = output {
                session.handle(ViewEvent::ViewportChanged, &mut CsvRenderer::new(path.clone()))?;
                info!(path = %path, "Station traffic written");
            }

            if json {
                print_json(&session.stations())?;
            }

            let summary = TrafficSummary::from_session(&session);
            print_json(&summary)?;
        }
        Commands::Sweep {
            sources,
            step,
            output,
        } => {
            let (trips, stations) = sources.resolve();
            let mut session = load_session(&trips, &stations).await;
            sweep(&mut session, step, output.as_deref())?;
        }
    }

    Ok(())
}

/// Visits the any-time position, then every `step` minutes from midnight,
/// recording one summary per window.
#[tracing::instrument(skip(session))]
fn sweep(session: &mut TrafficSession, step: u16, output: Option<&str>) -> Result<()> {
    let step = step.max(1);
    let positions = std::iter::once(TimeFilter::ANY_SENTINEL).chain(
        (0..=TimeFilter::MAX_MINUTE)
            .step_by(usize::from(step))
            .map(i32::from),
    );

    let mut renderer = LogRenderer::default();

    for selector in positions {
        session.handle(ViewEvent::TimeFilterChanged(selector), &mut renderer)?;

        let summary = TrafficSummary::from_session(session);

        info!(
            time = %summary.time_label,
            active_trips = summary.active_trips,
            active_pct = %format!("{:.1}", summary.active_pct()),
            busiest = summary.busiest_station.as_deref().unwrap_or("-"),
            max_total_traffic = summary.max_total_traffic,
            "Window summarized"
        );

        if let Some(path) = output {
            append_record(path, &summary)?;
        }
    }

    info!(windows = renderer.frames, "Sweep complete");
    Ok(())
}
