//! Itinerary model returned by the planner and accepted by the downloads

use serde::{Deserialize, Serialize};

use crate::{Result, TravelAgentError};

/// Plan for one day of the trip
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ItineraryDay {
    /// ISO date (YYYY-MM-DD)
    pub date: String,
    pub title: String,
    pub morning: String,
    pub afternoon: String,
    pub evening: String,
    #[serde(default)]
    pub notes: String,
}

/// Complete trip plan
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Itinerary {
    pub location: String,
    pub days: Vec<ItineraryDay>,
    pub weather_overview: String,
    /// IANA timezone of the destination, used to anchor calendar events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Itinerary {
    /// Parse an itinerary from an arbitrary JSON payload
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let itinerary: Itinerary = serde_json::from_value(value)
            .map_err(|_| TravelAgentError::validation("Itinerario inválido"))?;
        if itinerary.location.trim().is_empty() {
            return Err(TravelAgentError::validation("Itinerario inválido"));
        }
        Ok(itinerary)
    }

    /// File-name friendly version of the destination
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!("itinerario_{}", self.location.replace(' ', "_"))
    }
}

/// Point of interest suggested by the places provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Generated file handed back to the browser for download
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DownloadFile {
    pub filename: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notes_default_to_empty() {
        let itinerary = Itinerary::from_value(json!({
            "location": "Lisboa",
            "weather_overview": "Soleado",
            "days": [{
                "date": "2025-06-01",
                "title": "Alfama",
                "morning": "Castillo",
                "afternoon": "Tranvía 28",
                "evening": "Fado"
            }]
        }))
        .unwrap();

        assert_eq!(itinerary.days[0].notes, "");
        assert!(itinerary.timezone.is_none());
    }

    #[test]
    fn test_invalid_payload_rejected() {
        let err = Itinerary::from_value(json!({"location": "Lisboa"})).unwrap_err();
        assert_eq!(err.user_message(), "Itinerario inválido");

        let err = Itinerary::from_value(json!({
            "location": "  ",
            "weather_overview": "",
            "days": []
        }))
        .unwrap_err();
        assert!(matches!(err, TravelAgentError::Validation { .. }));
    }

    #[test]
    fn test_file_stem() {
        let itinerary = Itinerary {
            location: "San Sebastián de los Reyes".to_string(),
            days: Vec::new(),
            weather_overview: String::new(),
            timezone: None,
        };
        assert_eq!(itinerary.file_stem(), "itinerario_San_Sebastián_de_los_Reyes");
    }
}
