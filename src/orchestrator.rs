//! Chat orchestration: decides between planning, asking for details and
//! plain conversation with the LLM.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::TravelAgentConfig;
use crate::llm::LlmProvider;
use crate::models::{ChatMessage, ChatReply, ChatRequest, Place, TripPrefs, UserKeys};
use crate::places::PlacesProvider;
use crate::planner::Planner;
use crate::weather::WeatherService;
use crate::{Result, TravelAgentError};

const PLAN_KEYWORDS: [&str; 5] = ["itinerario", "plan", "viaje", "itinerary", "trip"];
const WEATHER_KEYWORDS: [&str; 7] = [
    "clima", "tiempo", "lluvia", "soleado", "weather", "rain", "sunny",
];

const CHAT_SYSTEM_PROMPT: &str =
    "Eres un asistente de viajes amable y útil. Responde de forma breve y clara.";
const CHAT_FALLBACK: &str =
    "Puedo ayudarte con destinos, clima e itinerarios. ¿A dónde te gustaría viajar?";

/// What the user seems to be asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Plan,
    Weather,
    Chat,
}

/// Keyword-based intent detection on the lowercased message
#[must_use]
pub fn detect_intent(text: &str) -> Intent {
    let lowered = text.to_lowercase();
    if PLAN_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        Intent::Plan
    } else if WEATHER_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        Intent::Weather
    } else {
        Intent::Chat
    }
}

/// Cut `text` to at most `max_chars` characters
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Shared per-request collaborators
#[derive(Clone)]
pub struct Orchestrator {
    weather: WeatherService,
    planner: Planner,
    llm: Arc<dyn LlmProvider>,
    places: Arc<dyn PlacesProvider>,
    max_message_chars: usize,
    max_history_messages: usize,
    max_trip_days: u32,
}

impl Orchestrator {
    pub fn new(
        config: &TravelAgentConfig,
        weather: WeatherService,
        llm: Arc<dyn LlmProvider>,
        places: Arc<dyn PlacesProvider>,
    ) -> Self {
        Self {
            weather,
            planner: Planner::new(llm.clone()),
            llm,
            places,
            max_message_chars: config.llm.max_message_chars,
            max_history_messages: config.llm.max_history_messages,
            max_trip_days: config.defaults.max_trip_days,
        }
    }

    pub fn weather(&self) -> &WeatherService {
        &self.weather
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    /// Handle one chat turn
    #[instrument(skip_all, fields(has_prefs = request.prefs.is_some(), history = request.history.len()))]
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatReply> {
        request.keys.validate()?;

        let text = request.message.trim();
        if text.is_empty() {
            return Err(TravelAgentError::validation("Mensaje vacío"));
        }
        let text = truncate_chars(text, self.max_message_chars);

        if let Some(prefs) = &request.prefs {
            prefs.validate(self.max_trip_days)?;
            return self.plan_trip(&request.keys, prefs).await;
        }

        match detect_intent(text) {
            Intent::Plan => Ok(ChatReply::NeedPrefs {
                message: "¿Para qué ciudad y cuántos días?".to_string(),
            }),
            Intent::Weather => Ok(ChatReply::NeedCity {
                message: "¿De qué ciudad necesitas el clima?".to_string(),
            }),
            Intent::Chat => self.chat(&request.keys, &request.history, text).await,
        }
    }

    async fn plan_trip(&self, keys: &UserKeys, prefs: &TripPrefs) -> Result<ChatReply> {
        let (weather, places) = futures::join!(
            self.weather
                .report(&prefs.location, prefs.start_date.as_deref(), prefs.days),
            self.lookup_places(keys, &prefs.location, &prefs.language),
        );
        let weather = weather?;

        let itinerary = self
            .planner
            .plan(
                &keys.openai_api_key,
                &prefs.location,
                &weather,
                &places,
                prefs.days,
                &prefs.language,
            )
            .await?;

        Ok(ChatReply::Itinerary {
            itinerary,
            weather,
            places,
            message: format!(
                "Listo. Te propongo un itinerario para {} con base en el clima previsto.",
                prefs.location
            ),
        })
    }

    /// Optional places lookup; failures only cost the enrichment
    pub async fn lookup_places(&self, keys: &UserKeys, city: &str, language: &str) -> Vec<Place> {
        let Some(api_key) = keys.places_key() else {
            return Vec::new();
        };

        match self.places.search(api_key, city, language).await {
            Ok(places) => places,
            Err(e) => {
                warn!("Places lookup for {} failed: {}", city, e);
                Vec::new()
            }
        }
    }

    async fn chat(&self, keys: &UserKeys, history: &[ChatMessage], text: &str) -> Result<ChatReply> {
        let recent = &history[history.len().saturating_sub(self.max_history_messages)..];

        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(ChatMessage::system(CHAT_SYSTEM_PROMPT));
        messages.extend(recent.iter().cloned());
        messages.push(ChatMessage::user(text));

        let answer = self.llm.complete(&keys.openai_api_key, &messages, None).await?;
        let answer = answer.trim();

        info!("Chat reply with {} history messages", recent.len());
        Ok(ChatReply::Chat {
            message: if answer.is_empty() {
                CHAT_FALLBACK.to_string()
            } else {
                answer.to_string()
            },
        })
    }
}
