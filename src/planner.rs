//! Itinerary planning on top of the LLM provider
//!
//! Builds the prompts from the weather report (and optional places), asks
//! the model for JSON matching [`itinerary_schema`] and parses the answer.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use crate::llm::{JsonSchemaFormat, LlmProvider};
use crate::models::{ChatMessage, Itinerary, Place, WeatherDay, WeatherReport};
use crate::{Result, TravelAgentError};

const SYSTEM_PROMPT: &str = "Eres un agente de viajes detallista y práctico. Devuelve respuestas claras en el idioma solicitado. \
Cumple estrictamente el esquema JSON indicado. Limita a planes realistas, con tiempos y zonas agrupadas \
para minimizar traslados. Incluye comida local, transporte sugerido y alternativas si llueve. No inventes precios.";

/// JSON schema the model must follow
#[must_use]
pub fn itinerary_schema() -> JsonSchemaFormat {
    let day = json!({
        "type": "object",
        "properties": {
            "date": {"type": "string"},
            "title": {"type": "string"},
            "morning": {"type": "string"},
            "afternoon": {"type": "string"},
            "evening": {"type": "string"},
            "notes": {"type": "string"}
        },
        "required": ["date", "title", "morning", "afternoon", "evening", "notes"],
        "additionalProperties": false
    });

    JsonSchemaFormat {
        name: "TravelItinerary".to_string(),
        schema: json!({
            "type": "object",
            "properties": {
                "location": {"type": "string"},
                "days": {"type": "array", "items": day},
                "weather_overview": {"type": "string"}
            },
            "required": ["location", "days", "weather_overview"],
            "additionalProperties": false
        }),
        strict: true,
    }
}

fn day_hint(day: &WeatherDay) -> &'static str {
    if day.is_rainy() {
        "(día lluvioso: prioriza planes bajo techo)"
    } else if day.is_sunny() {
        "(día soleado: actividades al aire libre recomendadas)"
    } else {
        ""
    }
}

/// One guidance line per forecast day
#[must_use]
pub fn day_guide(days: &[WeatherDay]) -> String {
    days.iter()
        .map(|day| {
            let mut line = format!("{}: {} {}", day.date, day.summary, day_hint(day));
            if let (Some(sunrise), Some(sunset)) = (&day.sunrise, &day.sunset) {
                line.push_str(&format!(" [luz de día {sunrise}–{sunset}]"));
            }
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn places_block(places: &[Place]) -> String {
    places
        .iter()
        .map(|place| {
            let mut line = format!("- {}", place.name);
            if let Some(category) = &place.category {
                line.push_str(&format!(" ({category})"));
            }
            if let Some(address) = &place.address {
                line.push_str(&format!(", {address}"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// System and user prompts for the planning call
#[must_use]
pub fn build_prompts(
    city: &str,
    report: &WeatherReport,
    places: &[Place],
    days: u32,
    language: &str,
) -> Vec<ChatMessage> {
    let mut user_prompt = format!(
        "Genera un itinerario para {days} día(s) en {city}.\n\
Idioma: {language}.\n\
Resumen del clima: {}.\n\
Guía por día:\n{}\n",
        report.overview,
        day_guide(&report.days)
    );

    if !places.is_empty() {
        user_prompt.push_str(&format!(
            "Lugares de interés sugeridos (úsalos si encajan):\n{}\n",
            places_block(places)
        ));
    }

    user_prompt
        .push_str("Estructura exacta: devuelve sólo JSON que cumpla el esquema (sin texto adicional).\n");

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user_prompt)]
}

/// Parse the model's answer, tolerating code fences or surrounding prose
pub fn parse_itinerary(raw: &str) -> Result<Itinerary> {
    let value: Value = match serde_json::from_str(raw.trim()) {
        Ok(value) => value,
        Err(_) => {
            let start = raw.find('{');
            let end = raw.rfind('}');
            match (start, end) {
                (Some(start), Some(end)) if start < end => serde_json::from_str(&raw[start..=end])
                    .map_err(|e| {
                        TravelAgentError::upstream(format!("LLM returned invalid JSON: {e}"))
                    })?,
                _ => return Err(TravelAgentError::upstream("LLM returned no JSON itinerary")),
            }
        }
    };

    serde_json::from_value(value)
        .map_err(|e| TravelAgentError::upstream(format!("LLM itinerary does not match schema: {e}")))
}

/// Turns a weather report into an itinerary through the LLM
#[derive(Clone)]
pub struct Planner {
    llm: Arc<dyn LlmProvider>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    #[instrument(skip(self, api_key, report, places), fields(model = self.llm.model()))]
    pub async fn plan(
        &self,
        api_key: &str,
        city: &str,
        report: &WeatherReport,
        places: &[Place],
        days: u32,
        language: &str,
    ) -> Result<Itinerary> {
        let messages = build_prompts(city, report, places, days, language);
        let schema = itinerary_schema();

        let raw = self.llm.complete(api_key, &messages, Some(&schema)).await?;
        let mut itinerary = parse_itinerary(&raw)?;

        if itinerary.days.len() != report.days.len() && !report.days.is_empty() {
            warn!(
                "Model planned {} days for a {}-day forecast",
                itinerary.days.len(),
                report.days.len()
            );
        }

        if report.geo.tz().is_some() {
            itinerary.timezone = Some(report.geo.timezone.clone());
        }

        info!("Planned {} days in {}", itinerary.days.len(), itinerary.location);
        Ok(itinerary)
    }
}
