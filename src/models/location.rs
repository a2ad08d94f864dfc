use serde::{Deserialize, Serialize};

/// Where a check-in/out happened, as resolved at creation time.
///
/// Stored as a JSON document in `attendance.location` and sent verbatim in
/// the upload payload (`fullLabel` is camelCase on the wire).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters.
    pub accuracy: f64,
    pub label: String,
    pub full_label: String,
    /// Which resolver produced the fix ("config", "ip", ...).
    pub source: String,
}

impl Location {
    /// Location with both labels derived from the coordinates.
    pub fn from_coordinates(latitude: f64, longitude: f64, accuracy: f64, source: &str) -> Self {
        let formatted = format_coordinates(latitude, longitude);
        Self {
            latitude,
            longitude,
            accuracy,
            label: formatted.clone(),
            full_label: formatted,
            source: source.to_string(),
        }
    }

    pub fn distance_to(&self, other: &Location) -> f64 {
        distance_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Short human label, falling back to formatted coordinates.
    pub fn display_label(&self) -> String {
        if self.label.trim().is_empty() {
            format_coordinates(self.latitude, self.longitude)
        } else {
            self.label.clone()
        }
    }
}

/// Format a coordinate pair as `"45.070312°N, 7.686856°E"`.
pub fn format_coordinates(lat: f64, lng: f64) -> String {
    let lat_dir = if lat >= 0.0 { 'N' } else { 'S' };
    let lng_dir = if lng >= 0.0 { 'E' } else { 'W' };

    format!(
        "{:.6}°{}, {:.6}°{}",
        lat.abs(),
        lat_dir,
        lng.abs(),
        lng_dir
    )
}

/// Great-circle distance in kilometers (haversine).
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}
