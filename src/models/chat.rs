//! Request and reply payloads for the chat and planning endpoints

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{Itinerary, Place, WeatherReport};
use crate::{Result, TravelAgentError};

/// Shortest string accepted as an OpenAI key
pub const MIN_API_KEY_LEN: usize = 10;

/// Author of a chat message
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Provider keys supplied by the browser on every request
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UserKeys {
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub places_api_key: Option<String>,
}

impl UserKeys {
    /// Reject missing or obviously malformed LLM keys
    pub fn validate(&self) -> Result<()> {
        let key = self.openai_api_key.trim();
        if key.is_empty() {
            return Err(TravelAgentError::unauthorized("Falta tu OPENAI_API_KEY."));
        }
        if key.len() < MIN_API_KEY_LEN {
            return Err(TravelAgentError::validation(
                "La OPENAI_API_KEY parece inválida (demasiado corta).",
            ));
        }
        Ok(())
    }

    /// Places key, if a usable one was given
    #[must_use]
    pub fn places_key(&self) -> Option<&str> {
        self.places_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Structured trip preferences sent by the planning form
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TripPrefs {
    pub location: String,
    pub days: u32,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

impl TripPrefs {
    pub fn validate(&self, max_days: u32) -> Result<()> {
        if self.location.trim().is_empty() {
            return Err(TravelAgentError::validation("Falta la ciudad de destino"));
        }
        if self.days < 1 || self.days > max_days {
            return Err(TravelAgentError::validation(format!(
                "days debe estar entre 1 y {max_days}"
            )));
        }
        parse_start_date(self.start_date.as_deref())?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    #[serde(default)]
    pub keys: UserKeys,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    #[serde(default)]
    pub prefs: Option<TripPrefs>,
}

/// Body of the direct planning endpoint
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ItineraryRequest {
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub days: Option<i64>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub places_api_key: Option<String>,
}

impl ItineraryRequest {
    #[must_use]
    pub fn keys(&self) -> UserKeys {
        UserKeys {
            openai_api_key: self.openai_api_key.clone(),
            places_api_key: self.places_api_key.clone(),
        }
    }
}

/// Reply of the chat endpoint, tagged by `type`
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatReply {
    Itinerary {
        itinerary: Itinerary,
        weather: WeatherReport,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        places: Vec<Place>,
        message: String,
    },
    NeedPrefs {
        message: String,
    },
    NeedCity {
        message: String,
    },
    Chat {
        message: String,
    },
}

fn default_language() -> String {
    "es".to_string()
}

/// Requested trip start relative to the day of the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDate {
    Today,
    Tomorrow,
    On(NaiveDate),
}

impl StartDate {
    /// Concrete date given the current day
    #[must_use]
    pub fn resolve(self, today: NaiveDate) -> NaiveDate {
        match self {
            StartDate::Today => today,
            StartDate::Tomorrow => today + Duration::days(1),
            StartDate::On(date) => date,
        }
    }
}

/// Parse the caller's start date; missing or blank means tomorrow
pub fn parse_start_date(raw: Option<&str>) -> Result<StartDate> {
    let value = raw.map(str::trim).unwrap_or_default();
    match value.to_lowercase().as_str() {
        "" | "tomorrow" | "mañana" => return Ok(StartDate::Tomorrow),
        "today" | "hoy" => return Ok(StartDate::Today),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(StartDate::On(date));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(StartDate::On(datetime.date()));
        }
    }

    Err(TravelAgentError::validation(
        "start_date debe ser ISO YYYY-MM-DD o vacío",
    ))
}
