//! AQI severity tiers and their display colors.

use serde::Serialize;

/// Severity tier derived from an AQI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// No reading, or a reading that could not be interpreted
    Unknown,
    /// 0-50
    Good,
    /// 51-100
    Moderate,
    /// 101 and above
    Unhealthy,
}

/// Every tier, in legend order.
pub const ALL_SEVERITIES: [Severity; 4] = [
    Severity::Good,
    Severity::Moderate,
    Severity::Unhealthy,
    Severity::Unknown,
];

/// Classify an AQI reading. Bounds 50 and 100 belong to the lower tier.
#[must_use]
pub fn classify(aqi: Option<i64>) -> Severity {
    match aqi {
        Some(v) if (0..=50).contains(&v) => Severity::Good,
        Some(v) if (51..=100).contains(&v) => Severity::Moderate,
        Some(v) if v >= 101 => Severity::Unhealthy,
        _ => Severity::Unknown,
    }
}

impl Severity {
    /// Label used in reports and on the map.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "無數據",
            Self::Good => "良好",
            Self::Moderate => "普通",
            Self::Unhealthy => "不健康",
        }
    }

    /// AQI range shown in the map legend.
    #[must_use]
    pub const fn range_label(self) -> &'static str {
        match self {
            Self::Unknown => "N/A",
            Self::Good => "0-50",
            Self::Moderate => "51-100",
            Self::Unhealthy => "101+",
        }
    }

    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Unknown => Color::Gray,
            Self::Good => Color::Green,
            Self::Moderate => Color::Yellow,
            Self::Unhealthy => Color::Red,
        }
    }
}

/// Marker color token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Gray,
    Green,
    Yellow,
    Red,
}

impl Color {
    /// CSS hex value for the map.
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Gray => "#95a5a6",
            Self::Green => "#2ecc71",
            Self::Yellow => "#ffd700",
            Self::Red => "#ff4444",
        }
    }

    /// ANSI escape for terminal output.
    #[must_use]
    pub const fn ansi(self) -> &'static str {
        match self {
            Self::Gray => "\x1b[90m",
            Self::Green => "\x1b[92m",
            Self::Yellow => "\x1b[93m",
            Self::Red => "\x1b[91m",
        }
    }
}
