//! Data models for MOENV `aqx_p_432` responses and the records derived from them.
//!
//! The API sends every field as a string (`"aqi": "52"`, `"latitude": "25.0632"`),
//! sometimes blank. `RawRecord` mirrors that shape; `StationReading` is the
//! validated form the report builder works on.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::classify::{Color, Severity};
use crate::errors::AqiError;

/// One station entry exactly as the API returns it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default, alias = "SiteName", deserialize_with = "loose_string")]
    pub sitename: String,

    #[serde(default, alias = "County", deserialize_with = "loose_string")]
    pub county: String,

    #[serde(default, alias = "AQI", deserialize_with = "loose_string")]
    pub aqi: String,

    #[serde(default, alias = "Pollutant", deserialize_with = "loose_string")]
    pub pollutant: String,

    #[serde(default, alias = "Latitude", deserialize_with = "loose_string")]
    pub latitude: String,

    #[serde(default, alias = "Longitude", deserialize_with = "loose_string")]
    pub longitude: String,

    #[serde(default, alias = "PublishTime", deserialize_with = "loose_string")]
    pub publishtime: String,
}

/// Accept a string, a bare number, or null for fields the API types inconsistently.
fn loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(s)) => s,
        Some(Loose::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

/// Parse a response body into raw records.
///
/// The endpoint answers either with a bare array of records or with an
/// envelope object carrying `records` (and optionally `success`/`message`).
///
/// # Errors
///
/// Returns an error if the body is not JSON, the envelope reports
/// `success: false`, or the shape is neither of the above. Individual
/// records that do not fit are skipped rather than failing the batch.
pub fn parse_payload(body: &str) -> Result<Vec<RawRecord>, AqiError> {
    let value: Value = serde_json::from_str(body)?;

    match &value {
        Value::Array(items) => Ok(records_from_values(items)),
        Value::Object(map) => {
            if map.get("success").and_then(Value::as_bool) == Some(false) {
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                return Err(AqiError::Rejected(message.to_string()));
            }
            match map.get("records") {
                Some(Value::Array(items)) => Ok(records_from_values(items)),
                Some(other) => Err(AqiError::InvalidResponse(format!(
                    "`records` should be an array, got {}",
                    json_kind(other)
                ))),
                None => Err(AqiError::InvalidResponse(
                    "response object has no `records` field".into(),
                )),
            }
        }
        other => Err(AqiError::InvalidResponse(format!(
            "expected an array or object, got {}",
            json_kind(other)
        ))),
    }
}

/// Deserialize records one by one so a malformed entry only costs itself.
fn records_from_values(items: &[Value]) -> Vec<RawRecord> {
    let records: Vec<RawRecord> = items
        .iter()
        .filter_map(|item| RawRecord::deserialize(item).ok())
        .collect();

    let dropped = items.len() - records.len();
    if dropped > 0 {
        debug!("dropped {} malformed records", dropped);
    }
    records
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A validated station reading.
///
/// Coordinates stay optional here: a reading without them is still a
/// reading, it just cannot be placed in a distance report.
#[derive(Debug, Clone, PartialEq)]
pub struct StationReading {
    pub site_name: String,
    pub county: String,
    pub aqi: Option<i64>,
    pub pollutant: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Opaque, passed through unmodified
    pub publish_time: String,
}

impl StationReading {
    /// Validate a raw record. Returns `None` when the site name is blank.
    #[must_use]
    pub fn from_raw(raw: &RawRecord) -> Option<Self> {
        let site_name = raw.sitename.trim();
        if site_name.is_empty() {
            return None;
        }

        Some(Self {
            site_name: site_name.to_string(),
            county: raw.county.trim().to_string(),
            aqi: parse_aqi(&raw.aqi),
            pollutant: raw.pollutant.trim().to_string(),
            latitude: parse_coordinate(&raw.latitude),
            longitude: parse_coordinate(&raw.longitude),
            publish_time: raw.publishtime.trim().to_string(),
        })
    }
}

/// Convert a batch of raw records, dropping the ones without a site name.
#[must_use]
pub fn readings_from_raw(records: &[RawRecord]) -> Vec<StationReading> {
    let readings: Vec<StationReading> = records.iter().filter_map(StationReading::from_raw).collect();

    let dropped = records.len() - readings.len();
    if dropped > 0 {
        debug!("dropped {} records with no site name", dropped);
    }
    readings
}

/// Parse an AQI field. Blank, non-numeric ("-", "ND"), fractional and
/// negative values all count as missing.
#[allow(clippy::cast_possible_truncation)]
fn parse_aqi(s: &str) -> Option<i64> {
    let s = s.trim();
    let value = match s.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let f = s.parse::<f64>().ok()?;
            if !f.is_finite() || f.fract() != 0.0 {
                return None;
            }
            f as i64
        }
    };
    (value >= 0).then_some(value)
}

fn parse_coordinate(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

/// A reading placed relative to the reference point and classified.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedStation {
    pub site_name: String,
    pub county: String,
    pub aqi: Option<i64>,
    pub pollutant: String,
    pub latitude: f64,
    pub longitude: f64,
    pub publish_time: String,
    /// Full precision; use [`EnrichedStation::display_distance`] for output
    pub distance_km: f64,
    pub severity: Severity,
    pub color: Color,
}

impl EnrichedStation {
    /// Distance rounded to two decimal places.
    #[must_use]
    pub fn display_distance(&self) -> f64 {
        (self.distance_km * 100.0).round() / 100.0
    }

    /// AQI as text, `N/A` when missing.
    #[must_use]
    pub fn aqi_text(&self) -> String {
        self.aqi.map_or_else(|| "N/A".to_string(), |v| v.to_string())
    }
}

/// Simplified station for JSON/NDJSON output.
#[derive(Debug, Clone, Serialize)]
pub struct OutputStation {
    pub sitename: String,
    pub county: String,
    pub aqi: Option<i64>,
    pub pollutant: String,
    pub status: &'static str,
    pub severity: Severity,
    pub color: Color,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
    pub publishtime: String,
}

impl From<&EnrichedStation> for OutputStation {
    fn from(s: &EnrichedStation) -> Self {
        Self {
            sitename: s.site_name.clone(),
            county: s.county.clone(),
            aqi: s.aqi,
            pollutant: s.pollutant.clone(),
            status: s.severity.label(),
            severity: s.severity,
            color: s.color,
            latitude: s.latitude,
            longitude: s.longitude,
            distance_km: s.display_distance(),
            publishtime: s.publish_time.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample_payload() {
        let json = include_str!("../tools/sample_aqx_p_432.json");
        let records = parse_payload(json).expect("failed to parse sample payload");
        assert_eq!(records.len(), 8);

        let readings = readings_from_raw(&records);
        // one record has a blank site name
        assert_eq!(readings.len(), 7);

        let wanhua = &readings[0];
        assert_eq!(wanhua.site_name, "萬華");
        assert_eq!(wanhua.county, "臺北市");
        assert_eq!(wanhua.aqi, Some(34));
        assert_eq!(wanhua.pollutant, "");
        assert_eq!(wanhua.latitude, Some(25.046503));
        assert_eq!(wanhua.longitude, Some(121.507972));
        assert_eq!(wanhua.publish_time, "2024/11/20 14:00:00");
    }

    #[test]
    fn test_parse_bare_array() {
        let json = r#"[{"sitename": "大同", "aqi": "52", "latitude": "25.0632", "longitude": "121.513311"}]"#;
        let records = parse_payload(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sitename, "大同");
        assert_eq!(records[0].county, "");
    }

    #[test]
    fn test_parse_numbers_nulls_and_uppercase_keys() {
        let json = r#"[{"SiteName": "中山", "AQI": 45, "Latitude": 25.062361, "Longitude": null}]"#;
        let records = parse_payload(json).unwrap();
        let reading = StationReading::from_raw(&records[0]).unwrap();
        assert_eq!(reading.site_name, "中山");
        assert_eq!(reading.aqi, Some(45));
        assert_eq!(reading.latitude, Some(25.062361));
        assert_eq!(reading.longitude, None);
    }

    #[test]
    fn test_malformed_records_skipped() {
        let json = r#"{"records": [
            {"sitename": "萬華", "aqi": "34", "latitude": "25.046503", "longitude": "121.507972"},
            {"sitename": "壞", "aqi": true, "latitude": "25.0", "longitude": "121.5"},
            null,
            {"sitename": {"zh": "大同"}, "aqi": "52"},
            "中山"
        ]}"#;
        let records = parse_payload(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sitename, "萬華");

        let bare = r#"[null, {"sitename": "古亭", "aqi": "28"}, {"aqi": [1]}]"#;
        let records = parse_payload(bare).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sitename, "古亭");
    }

    #[test]
    fn test_records_must_be_array() {
        let json = r#"{"records": {"sitename": "萬華"}}"#;
        assert!(matches!(parse_payload(json), Err(AqiError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_rejected_envelope() {
        let json = r#"{"success": false, "message": "API key invalid"}"#;
        match parse_payload(json) {
            Err(AqiError::Rejected(msg)) => assert_eq!(msg, "API key invalid"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_envelope_without_records() {
        let json = r#"{"success": true}"#;
        assert!(matches!(parse_payload(json), Err(AqiError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_unexpected_shape() {
        assert!(matches!(parse_payload("42"), Err(AqiError::InvalidResponse(_))));
        assert!(matches!(parse_payload("not json"), Err(AqiError::Parse(_))));
    }

    #[test]
    fn test_aqi_parsing() {
        assert_eq!(parse_aqi("52"), Some(52));
        assert_eq!(parse_aqi(" 7 "), Some(7));
        assert_eq!(parse_aqi("52.0"), Some(52));
        assert_eq!(parse_aqi("52.5"), None);
        assert_eq!(parse_aqi(""), None);
        assert_eq!(parse_aqi("-"), None);
        assert_eq!(parse_aqi("ND"), None);
        assert_eq!(parse_aqi("-3"), None);
    }

    #[test]
    fn test_blank_site_name_rejected() {
        let raw = RawRecord {
            sitename: "   ".into(),
            aqi: "20".into(),
            ..RawRecord::default()
        };
        assert!(StationReading::from_raw(&raw).is_none());
    }

    #[test]
    fn test_display_distance_rounds() {
        let station = EnrichedStation {
            site_name: "古亭".into(),
            county: "臺北市".into(),
            aqi: None,
            pollutant: String::new(),
            latitude: 25.020608,
            longitude: 121.529556,
            publish_time: String::new(),
            distance_km: 3.277_569,
            severity: Severity::Unknown,
            color: Color::Gray,
        };
        assert!((station.display_distance() - 3.28).abs() < 1e-12);
        assert_eq!(station.aqi_text(), "N/A");

        let out = OutputStation::from(&station);
        assert_eq!(out.status, "無數據");
        assert!((out.distance_km - 3.28).abs() < 1e-12);
    }
}
