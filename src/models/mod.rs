//! Data models for the travel agent service
//!
//! All types are request/response payloads that live for one request:
//! - Location: geocoded destination
//! - Weather: daily forecast and weather report
//! - Itinerary: planned days, suggested places and download files
//! - Chat: chat/planning requests and tagged replies

pub mod chat;
pub mod itinerary;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use chat::{
    ChatMessage, ChatReply, ChatRequest, ChatRole, ItineraryRequest, StartDate, TripPrefs,
    UserKeys, parse_start_date,
};
pub use itinerary::{DownloadFile, Itinerary, ItineraryDay, Place};
pub use location::Location;
pub use weather::{WeatherDay, WeatherReport};
