//! Optional deduplication of readings by site name.
//!
//! The API occasionally returns several entries for one station. This step
//! runs before the report builder, only when asked for, and keeps one
//! reading per site: the one with the newest publish time. Readings whose
//! time cannot be parsed never replace one that can; on a tie the earlier
//! entry wins. Survivors stay at the position of the site's first entry.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::models::StationReading;

/// Publish time formats seen from the provider.
const PUBLISH_TIME_FORMATS: [&str; 3] = ["%Y/%m/%d %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a provider publish time, if it is in a known format.
#[must_use]
pub fn parse_publish_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    PUBLISH_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Outcome of a deduplication pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Deduped {
    pub readings: Vec<StationReading>,
    /// Entries dropped in favor of another entry for the same site
    pub duplicates: usize,
}

/// Keep one reading per site name.
#[must_use]
pub fn dedupe_by_site(readings: Vec<StationReading>) -> Deduped {
    let total = readings.len();
    let mut slots: Vec<StationReading> = Vec::with_capacity(total);
    let mut index: HashMap<String, usize> = HashMap::with_capacity(total);

    for reading in readings {
        match index.get(&reading.site_name) {
            Some(&pos) => {
                if is_newer(&reading, &slots[pos]) {
                    slots[pos] = reading;
                }
            }
            None => {
                index.insert(reading.site_name.clone(), slots.len());
                slots.push(reading);
            }
        }
    }

    let duplicates = total - slots.len();
    debug_assert!(slots.len() <= total);

    Deduped {
        readings: slots,
        duplicates,
    }
}

fn is_newer(candidate: &StationReading, current: &StationReading) -> bool {
    match (
        parse_publish_time(&candidate.publish_time),
        parse_publish_time(&current.publish_time),
    ) {
        (Some(new), Some(old)) => new > old,
        (Some(_), None) => true,
        _ => false,
    }
}
