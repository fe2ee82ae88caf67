//! Interactive station map.
//!
//! Renders a standalone HTML page backed by Leaflet and OpenStreetMap tiles:
//! one circle marker per station colored by severity, a tooltip, a popup
//! with the details, and a fixed legend.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::classify::ALL_SEVERITIES;
use crate::errors::AqiError;
use crate::models::EnrichedStation;

const LEAFLET_VERSION: &str = "1.9.4";

/// Map configuration.
#[derive(Debug, Clone)]
pub struct MapOptions {
    /// Initial view center (lat, lon)
    pub center: (f64, f64),
    pub zoom: u8,
    pub title: String,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            // roughly the middle of Taiwan
            center: (23.5, 121.0),
            zoom: 7,
            title: "AQI 空氣品質監測地圖".to_string(),
        }
    }
}

/// What the page script needs for one marker.
#[derive(Debug, Serialize)]
struct Marker {
    lat: f64,
    lon: f64,
    color: &'static str,
    tooltip: String,
    popup: String,
}

impl From<&EnrichedStation> for Marker {
    fn from(s: &EnrichedStation) -> Self {
        let hex = s.color.hex();
        let aqi = s.aqi_text();

        let popup = format!(
            "<div class=\"popup\">\
             <p class=\"site\">{site}</p>\
             <p class=\"county\">{county}</p>\
             <hr>\
             <p class=\"aqi\" style=\"color: {hex};\">AQI: {aqi}</p>\
             <p>{label}</p>\
             <p class=\"distance\">{distance:.2} km</p>\
             </div>",
            site = escape_html(&s.site_name),
            county = escape_html(&s.county),
            label = s.severity.label(),
            distance = s.display_distance(),
        );

        Self {
            lat: s.latitude,
            lon: s.longitude,
            color: hex,
            // Leaflet renders tooltip text as HTML
            tooltip: format!("{} - AQI: {aqi}", escape_html(&s.site_name)),
            popup,
        }
    }
}

/// Escape text for HTML element content and attribute values.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize for embedding inside a `<script>` element.
fn script_json<T: Serialize>(value: &T) -> Result<String, AqiError> {
    let json = serde_json::to_string(value)?;
    // these only ever occur inside JSON strings, where \uXXXX is equivalent
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

fn legend_html() -> String {
    let mut rows = String::new();
    for severity in ALL_SEVERITIES {
        rows.push_str(&format!(
            "<p><span class=\"swatch\" style=\"background-color: {};\">{}</span> {}</p>",
            severity.color().hex(),
            severity.range_label(),
            severity.label()
        ));
    }
    format!(
        "<div class=\"legend\"><p class=\"legend-title\">AQI 空氣品質等級</p><hr>{rows}</div>"
    )
}

/// Render the map page for `stations`.
///
/// # Errors
///
/// Returns an error if marker data cannot be serialized.
pub fn render_map(stations: &[EnrichedStation], options: &MapOptions) -> Result<String, AqiError> {
    let markers: Vec<Marker> = stations.iter().map(Marker::from).collect();
    let markers = script_json(&markers)?;
    let (lat, lon) = options.center;

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@{leaflet}/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@{leaflet}/dist/leaflet.js"></script>
<style>
  html, body, #map {{ height: 100%; margin: 0; }}
  .popup {{ font-family: "Microsoft JhengHei", sans-serif; width: 180px; }}
  .popup p {{ margin: 3px 0; font-size: 12px; }}
  .popup .site {{ font-size: 14px; font-weight: bold; }}
  .popup .county {{ color: #666; }}
  .popup .aqi {{ font-size: 16px; font-weight: bold; }}
  .popup hr, .legend hr {{ margin: 5px 0; border: none; border-top: 1px solid #ddd; }}
  .legend {{ position: fixed; bottom: 50px; right: 50px; width: 200px; z-index: 9999;
            background-color: white; border: 2px solid #333; border-radius: 5px;
            font-family: "Microsoft JhengHei", sans-serif; font-size: 13px; padding: 12px; }}
  .legend p {{ margin: 5px 0; }}
  .legend-title {{ font-weight: bold; text-align: center; }}
  .swatch {{ padding: 4px 10px; border-radius: 3px; font-weight: bold; }}
</style>
</head>
<body>
<div id="map"></div>
{legend}
<script>
  var map = L.map("map").setView([{lat}, {lon}], {zoom});
  L.tileLayer("https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
    maxZoom: 18,
    attribution: "&copy; OpenStreetMap contributors"
  }}).addTo(map);
  var stations = {markers};
  stations.forEach(function (s) {{
    L.circleMarker([s.lat, s.lon], {{
      radius: 10, color: s.color, weight: 2,
      fill: true, fillColor: s.color, fillOpacity: 0.8
    }})
      .bindPopup(s.popup, {{ maxWidth: 200 }})
      .bindTooltip(s.tooltip)
      .addTo(map);
  }});
</script>
</body>
</html>
"#,
        title = escape_html(&options.title),
        leaflet = LEAFLET_VERSION,
        legend = legend_html(),
        zoom = options.zoom,
    ))
}

/// Render and write the map to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if rendering fails or the file cannot be written.
pub fn write_map(path: &Path, stations: &[EnrichedStation], options: &MapOptions) -> Result<(), AqiError> {
    let html = render_map(stations, options)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html)?;
    Ok(())
}
