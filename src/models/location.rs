//! Location model for geocoded destinations

use serde::{Deserialize, Serialize};

/// Geocoded destination
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Location name (city, region, etc.)
    pub name: String,
    /// Country name as returned by the geocoder
    pub country: Option<String>,
    /// Latitude in decimal degrees
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Longitude in decimal degrees
    #[serde(rename = "lon")]
    pub longitude: f64,
    /// IANA timezone name, or `auto` when unknown
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "auto".to_string()
}

impl Location {
    /// Create a new location without country or timezone
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, name: String) -> Self {
        Self {
            name,
            country: None,
            latitude,
            longitude,
            timezone: default_timezone(),
        }
    }

    /// Set the IANA timezone
    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Parsed timezone, `None` for `auto` or unknown names
    #[must_use]
    pub fn tz(&self) -> Option<chrono_tz::Tz> {
        self.timezone.parse().ok()
    }
}
