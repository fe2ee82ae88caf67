//! Output formatters for station reports.
//!
//! Terminal output supports human-readable (with colors), JSON, and NDJSON
//! formats. The CSV report is the spreadsheet-friendly artifact written to disk.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::errors::AqiError;
use crate::models::{EnrichedStation, OutputStation};

// ANSI codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Byte-order mark so spreadsheet tools detect UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// Write stations as an aligned, color-coded table.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, stations: &[EnrichedStation]) -> io::Result<()> {
    writeln!(
        writer,
        "{DIM}{:>9} │ {:>4} │ {:<6} │ {:<10} │ {:<8} │ published{RESET}",
        "distance", "aqi", "status", "site", "county"
    )?;

    for station in stations {
        let color = station.color.ansi();
        let pollutant = if station.pollutant.is_empty() {
            String::new()
        } else {
            format!(" {DIM}({}){RESET}", station.pollutant)
        };

        writeln!(
            writer,
            "{:>7.2}km │ {color}{BOLD}{:>4}{RESET} │ {color}{}{RESET} │ {} │ {} │ {DIM}{}{RESET}{pollutant}",
            station.display_distance(),
            station.aqi_text(),
            pad(station.severity.label(), 6),
            pad(&station.site_name, 10),
            pad(&station.county, 8),
            station.publish_time,
        )?;
    }
    Ok(())
}

/// Left-align `s` to `width` terminal columns. CJK characters take two.
fn pad(s: &str, width: usize) -> String {
    let used: usize = s.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum();
    format!("{s}{}", " ".repeat(width.saturating_sub(used)))
}

/// Write stations as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, stations: &[EnrichedStation]) -> io::Result<()> {
    let output: Vec<OutputStation> = stations.iter().map(OutputStation::from).collect();
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write stations as newline-delimited JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(writer: &mut W, stations: &[EnrichedStation]) -> io::Result<()> {
    for station in stations {
        let output = OutputStation::from(station);
        let json = serde_json::to_string(&output)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write stations in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_stations<W: Write>(
    writer: &mut W,
    stations: &[EnrichedStation],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, stations),
        Format::Json => write_json(writer, stations),
        Format::Ndjson => write_ndjson(writer, stations),
    }
}

/// One CSV row. Field order is the column order.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    sitename: &'a str,
    county: &'a str,
    aqi: Option<i64>,
    pollutant: &'a str,
    status: &'static str,
    latitude: f64,
    longitude: f64,
    distance_km: String,
    publishtime: &'a str,
}

impl<'a> From<&'a EnrichedStation> for CsvRow<'a> {
    fn from(s: &'a EnrichedStation) -> Self {
        Self {
            sitename: &s.site_name,
            county: &s.county,
            aqi: s.aqi,
            pollutant: &s.pollutant,
            status: s.severity.label(),
            latitude: s.latitude,
            longitude: s.longitude,
            distance_km: format!("{:.2}", s.display_distance()),
            publishtime: &s.publish_time,
        }
    }
}

const CSV_HEADER: [&str; 9] = [
    "sitename",
    "county",
    "aqi",
    "pollutant",
    "status",
    "latitude",
    "longitude",
    "distance_km",
    "publishtime",
];

/// Write the CSV report, BOM first. Rows keep the order they are given in.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_csv<W: Write>(mut writer: W, stations: &[EnrichedStation]) -> Result<(), AqiError> {
    writer.write_all(UTF8_BOM)?;

    // Header written explicitly so an empty report still has one
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    for station in stations {
        csv_writer.serialize(CsvRow::from(station))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the CSV report to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_csv_file(path: &Path, stations: &[EnrichedStation]) -> Result<(), AqiError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write_csv(BufWriter::new(file), stations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;

    fn station(name: &str, aqi: Option<i64>, distance_km: f64) -> EnrichedStation {
        let severity = classify(aqi);
        EnrichedStation {
            site_name: name.to_string(),
            county: "臺北市".to_string(),
            aqi,
            pollutant: if aqi == Some(52) { "細懸浮微粒".into() } else { String::new() },
            latitude: 25.0632,
            longitude: 121.513311,
            publish_time: "2024/11/20 14:00:00".to_string(),
            distance_km,
            severity,
            color: severity.color(),
        }
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("human".parse::<Format>().unwrap(), Format::Human);
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("ndjson".parse::<Format>().unwrap(), Format::Ndjson);
        assert!("invalid".parse::<Format>().is_err());
    }

    #[test]
    fn test_csv_layout() {
        let stations = vec![station("萬華", Some(34), 0.920_83), station("大同", Some(52), 1.752_26)];
        let mut buf = Vec::new();
        write_csv(&mut buf, &stations).unwrap();

        assert!(buf.starts_with(UTF8_BOM));
        let text = String::from_utf8(buf[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "sitename,county,aqi,pollutant,status,latitude,longitude,distance_km,publishtime"
        );
        assert_eq!(
            lines[1],
            "萬華,臺北市,34,,良好,25.0632,121.513311,0.92,2024/11/20 14:00:00"
        );
        assert_eq!(
            lines[2],
            "大同,臺北市,52,細懸浮微粒,普通,25.0632,121.513311,1.75,2024/11/20 14:00:00"
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_csv_missing_aqi_is_empty_field() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[station("新莊", None, 8.58)]).unwrap();
        let text = String::from_utf8(buf[UTF8_BOM.len()..].to_vec()).unwrap();
        assert!(text.lines().nth(1).unwrap().starts_with("新莊,臺北市,,,無數據,"));
    }

    #[test]
    fn test_csv_empty_report_has_header() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[]).unwrap();
        let text = String::from_utf8(buf[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_csv_file_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("aqi_report.csv");
        write_csv_file(&path, &[station("萬華", Some(34), 0.92)]).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert_eq!(String::from_utf8_lossy(&bytes).lines().count(), 2);
    }

    #[test]
    fn test_json_output() {
        let mut buf = Vec::new();
        write_stations(&mut buf, &[station("大同", Some(52), 1.752_26)], Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        let first = &value[0];
        assert_eq!(first["sitename"], "大同");
        assert_eq!(first["aqi"], 52);
        assert_eq!(first["status"], "普通");
        assert_eq!(first["severity"], "moderate");
        assert_eq!(first["color"], "yellow");
        assert_eq!(first["distance_km"], 1.75);
    }

    #[test]
    fn test_ndjson_one_line_per_station() {
        let stations = vec![station("萬華", Some(34), 0.92), station("新莊", None, 8.58)];
        let mut buf = Vec::new();
        write_stations(&mut buf, &stations, Format::Ndjson).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert!(second["aqi"].is_null());
        assert_eq!(second["severity"], "unknown");
    }

    #[test]
    fn test_human_output_mentions_every_station() {
        let stations = vec![station("萬華", Some(34), 0.92), station("左營", Some(112), 340.1)];
        let mut buf = Vec::new();
        write_stations(&mut buf, &stations, Format::Human).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("萬華"));
        assert!(text.contains("0.92km"));
        assert!(text.contains("不健康"));
    }

    #[test]
    fn test_pad_counts_wide_chars() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("萬華", 6), "萬華  ");
        assert_eq!(pad("不健康", 4), "不健康");
    }
}
