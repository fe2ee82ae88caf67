//! Distance report: filter, enrich and sort station readings.

use std::collections::HashMap;

use tracing::debug;

use crate::classify::{Severity, classify};
use crate::geo::ReferencePoint;
use crate::models::{EnrichedStation, StationReading};

/// Build the distance-sorted report for `readings`.
///
/// Readings without finite, in-range coordinates are skipped; readings without an
/// AQI are kept and classified as unknown. Equal distances keep their
/// input order.
#[must_use]
pub fn build_report(readings: &[StationReading], reference: ReferencePoint) -> Vec<EnrichedStation> {
    let mut stations: Vec<EnrichedStation> = readings
        .iter()
        .filter_map(|reading| enrich(reading, reference))
        .collect();

    // sort_by is stable
    stations.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    let skipped = readings.len() - stations.len();
    if skipped > 0 {
        debug!("skipped {} readings without usable coordinates", skipped);
    }

    stations
}

fn enrich(reading: &StationReading, reference: ReferencePoint) -> Option<EnrichedStation> {
    let (latitude, longitude) = match (reading.latitude, reading.longitude) {
        (Some(lat), Some(lon)) if is_valid_coordinate(lat, lon) => (lat, lon),
        _ => {
            debug!("no usable coordinates for {}", reading.site_name);
            return None;
        }
    };

    let severity = classify(reading.aqi);

    Some(EnrichedStation {
        site_name: reading.site_name.clone(),
        county: reading.county.clone(),
        aqi: reading.aqi,
        pollutant: reading.pollutant.clone(),
        latitude,
        longitude,
        publish_time: reading.publish_time.clone(),
        distance_km: reference.distance_to(latitude, longitude),
        severity,
        color: severity.color(),
    })
}

/// Latitude within [-90, 90] and longitude within [-180, 180]. NaN fails both.
fn is_valid_coordinate(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

/// Headline numbers for a finished report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary<'a> {
    pub total: usize,
    pub by_severity: HashMap<Severity, usize>,
    pub nearest: Option<&'a EnrichedStation>,
}

impl ReportSummary<'_> {
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

/// Summarize a report produced by [`build_report`].
#[must_use]
pub fn summarize(stations: &[EnrichedStation]) -> ReportSummary<'_> {
    let mut by_severity = HashMap::new();
    for station in stations {
        *by_severity.entry(station.severity).or_insert(0) += 1;
    }

    ReportSummary {
        total: stations.len(),
        by_severity,
        nearest: stations.first(),
    }
}
