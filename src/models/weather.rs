//! Daily weather model

use serde::{Deserialize, Serialize};

use super::Location;

/// Precipitation from which a day counts as rainy for planning (mm)
pub const RAINY_DAY_MM: f32 = 2.0;

/// Forecast for a single day of the trip
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherDay {
    /// ISO date (YYYY-MM-DD)
    pub date: String,
    /// WMO weather code
    pub code: u8,
    /// Human-readable description of the weather code
    pub summary: String,
    /// Maximum temperature in Celsius
    pub temp_max: f32,
    /// Minimum temperature in Celsius
    pub temp_min: f32,
    /// Precipitation sum in mm
    pub precipitation_sum: f32,
    /// Local sunrise time (HH:MM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<String>,
    /// Local sunset time (HH:MM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset: Option<String>,
}

impl WeatherDay {
    /// Enough rain to favour indoor plans
    #[must_use]
    pub fn is_rainy(&self) -> bool {
        self.precipitation_sum >= RAINY_DAY_MM
    }

    /// Clear or mainly clear sky
    #[must_use]
    pub fn is_sunny(&self) -> bool {
        matches!(self.code, 0 | 1)
    }

    /// Partly cloudy, overcast or fog
    #[must_use]
    pub fn is_cloudy(&self) -> bool {
        matches!(self.code, 2 | 3 | 45 | 48)
    }
}

/// Weather lookup result for a destination
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WeatherReport {
    /// Geocoded destination
    pub geo: Location,
    /// One entry per trip day
    pub days: Vec<WeatherDay>,
    /// Short overall summary of the period
    pub overview: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(code: u8, precipitation_sum: f32) -> WeatherDay {
        WeatherDay {
            date: "2025-06-01".to_string(),
            code,
            summary: String::new(),
            temp_max: 24.4,
            temp_min: 15.6,
            precipitation_sum,
            sunrise: None,
            sunset: None,
        }
    }

    #[test]
    fn test_day_classification() {
        assert!(day(0, 0.0).is_sunny());
        assert!(day(1, 0.0).is_sunny());
        assert!(!day(2, 0.0).is_sunny());
        assert!(day(45, 0.0).is_cloudy());
        assert!(day(61, 2.0).is_rainy());
        assert!(!day(61, 1.9).is_rainy());
    }

    #[test]
    fn test_sun_times_omitted_when_unknown() {
        let json = serde_json::to_value(day(0, 0.0)).unwrap();
        assert!(json.get("sunrise").is_none());
        assert_eq!(json["code"], 0);
    }
}
