//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::client::{DEFAULT_LIMIT, MOENV_AQI_URL};
use crate::geo::ReferencePoint;
use crate::output::Format;

/// Taiwan air quality stations, mapped and sorted by distance.
#[derive(Parser, Debug)]
#[command(name = "aqimap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch readings and write the HTML map and CSV report
    Report(ReportArgs),

    /// Fetch readings and print them sorted by distance
    List(ListArgs),
}

/// Options shared by every command that fetches data.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// MOENV open-data API key
    #[arg(long, env = "MOENV_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Dataset endpoint
    #[arg(long, default_value = MOENV_AQI_URL)]
    pub endpoint: String,

    /// Maximum number of records to request
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    /// Total fetch attempts, counting the first (only transient failures are retried)
    #[arg(long, default_value = "3")]
    pub attempts: u32,

    /// Point distances are measured from: lat,lon
    #[arg(long, default_value = "25.0478,121.5170", value_parser = parse_reference)]
    pub reference: ReferencePoint,

    /// Keep only the newest reading per site name
    #[arg(long)]
    pub dedupe: bool,
}

/// Arguments for the `report` command.
#[derive(Parser, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Directory the map and report are written to
    #[arg(long, default_value = "outputs")]
    pub output_dir: PathBuf,

    /// Map file name inside the output directory
    #[arg(long, default_value = "aqi_map.html")]
    pub map_file: String,

    /// CSV file name inside the output directory
    #[arg(long, default_value = "aqi_report.csv")]
    pub csv_file: String,

    /// Skip the HTML map
    #[arg(long)]
    pub no_map: bool,
}

/// Arguments for the `list` command.
#[derive(Parser, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Only show the nearest N stations
    #[arg(long, short = 'n')]
    pub top: Option<usize>,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

/// Parse a reference point from string.
fn parse_reference(s: &str) -> Result<ReferencePoint, String> {
    s.parse()
}
