//! aqimap - Taiwan air quality on a map, sorted by distance.
//!
//! Fetches hourly AQI readings from the MOENV open-data API, measures each
//! station's distance from a reference point, and writes an interactive
//! map plus a distance-sorted CSV report.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

mod classify;
mod cli;
mod client;
mod dedup;
mod errors;
mod geo;
mod map;
mod models;
mod output;
mod report;

use classify::ALL_SEVERITIES;
use cli::{Cli, Command, FetchArgs};
use client::MoenvClient;
use errors::AqiError;
use models::StationReading;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // A missing .env is fine; the key may come from the real environment
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Report(args) => cmd_report(args),
        Command::List(args) => cmd_list(args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Fetch, validate and optionally deduplicate station readings.
fn fetch_readings(args: &FetchArgs) -> Result<Vec<StationReading>> {
    let api_key = args.api_key.as_deref().ok_or(AqiError::MissingApiKey)?;
    let client = MoenvClient::new(api_key)
        .context("failed to create MOENV client")?
        .with_base_url(&args.endpoint);

    let records = client
        .fetch_with_retry(args.limit, args.attempts)
        .context("failed to fetch AQI records")?;
    info!("fetched {} station records", records.len());

    let readings = models::readings_from_raw(&records);

    if !args.dedupe {
        return Ok(readings);
    }

    let deduped = dedup::dedupe_by_site(readings);
    if deduped.duplicates > 0 {
        info!("dropped {} duplicate site entries", deduped.duplicates);
    }
    Ok(deduped.readings)
}

/// Execute the `report` command - write the map and CSV report.
fn cmd_report(args: cli::ReportArgs) -> Result<()> {
    let readings = fetch_readings(&args.fetch)?;
    let reference = args.fetch.reference;

    let stations = report::build_report(&readings, reference);
    let summary = report::summarize(&stations);

    let counts: Vec<String> = ALL_SEVERITIES
        .iter()
        .map(|s| format!("{} {}", s.label(), summary.count(*s)))
        .collect();
    info!(
        "{} stations placed relative to {} ({})",
        summary.total,
        reference,
        counts.join(", ")
    );

    let map_path = args.output_dir.join(&args.map_file);
    if args.no_map {
        info!("map skipped");
    } else if stations.is_empty() {
        warn!("no stations with usable coordinates, map not written");
    } else {
        map::write_map(&map_path, &stations, &map::MapOptions::default())
            .with_context(|| format!("failed to write map to {}", map_path.display()))?;
        info!("map saved: {}", map_path.display());
    }

    let csv_path = args.output_dir.join(&args.csv_file);
    output::write_csv_file(&csv_path, &stations)
        .with_context(|| format!("failed to write report to {}", csv_path.display()))?;
    info!("report saved: {}", csv_path.display());

    if let Some(nearest) = summary.nearest {
        info!(
            "nearest station: {} ({:.2} km, AQI {})",
            nearest.site_name,
            nearest.display_distance(),
            nearest.aqi_text()
        );
    }

    Ok(())
}

/// Execute the `list` command - print stations nearest first.
fn cmd_list(args: cli::ListArgs) -> Result<()> {
    let readings = fetch_readings(&args.fetch)?;

    let mut stations = report::build_report(&readings, args.fetch.reference);
    if stations.is_empty() {
        warn!("no stations with usable coordinates");
    }

    if let Some(top) = args.top {
        stations.truncate(top);
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_stations(&mut handle, &stations, args.format)?;
    handle.flush()?;

    Ok(())
}
