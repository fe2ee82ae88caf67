//! Great-circle distance and the reference point stations are measured from.

/// Earth radius in kilometers for haversine calculations.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Taipei Main Station, the default reference point.
pub const TAIPEI_MAIN_STATION: ReferencePoint = ReferencePoint {
    latitude: 25.0478,
    longitude: 121.5170,
};

/// Calculate the great-circle distance between two points using the haversine formula.
///
/// Returns distance in kilometers. Inputs are not range-checked and the
/// result is meaningless for non-finite values.
#[must_use]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // rounding can push sqrt(a) a hair above 1 for antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// A fixed point that every station distance is measured against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl ReferencePoint {
    /// Distance in kilometers from this point to `(lat, lon)`.
    #[must_use]
    pub fn distance_to(&self, lat: f64, lon: f64) -> f64 {
        haversine_distance(self.latitude, self.longitude, lat, lon)
    }
}

impl Default for ReferencePoint {
    fn default() -> Self {
        TAIPEI_MAIN_STATION
    }
}

impl std::fmt::Display for ReferencePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

impl std::str::FromStr for ReferencePoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 2 {
            return Err(format!(
                "reference point requires 2 values (lat,lon), got {}",
                parts.len()
            ));
        }

        let vals: Result<Vec<f64>, _> = parts.iter().map(|p| p.trim().parse::<f64>()).collect();
        let vals = vals.map_err(|e| format!("invalid number in reference point: {e}"))?;

        let point = Self {
            latitude: vals[0],
            longitude: vals[1],
        };

        // Validate ranges (also rejects NaN)
        if !(-90.0..=90.0).contains(&point.latitude) {
            return Err(format!("latitude {} out of range [-90, 90]", point.latitude));
        }
        if !(-180.0..=180.0).contains(&point.longitude) {
            return Err(format!(
                "longitude {} out of range [-180, 180]",
                point.longitude
            ));
        }

        Ok(point)
    }
}
