//! `TravelAgent` - conversational travel itinerary assistant
//!
//! Combines an Open-Meteo forecast, optional Google Places suggestions and
//! an OpenAI-compatible model into day-by-day itineraries, exposed over a
//! small JSON API with text and iCalendar downloads.

pub mod api;
pub mod calendar;
pub mod config;
pub mod error;
pub mod export;
pub mod http;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod places;
pub mod planner;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use config::TravelAgentConfig;
pub use error::TravelAgentError;
pub use llm::{LlmProvider, OpenAiClient};
pub use models::{ChatReply, ChatRequest, Itinerary, Location, WeatherDay, WeatherReport};
pub use orchestrator::Orchestrator;
pub use places::{GooglePlacesClient, PlacesProvider};
pub use planner::Planner;
pub use weather::{OpenMeteoClient, WeatherService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TravelAgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
