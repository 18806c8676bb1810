use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::config::{DefaultsConfig, TravelAgentConfig};
use crate::export::{render_ics, render_text};
use crate::http::build_client;
use crate::llm::{LlmProvider, OpenAiClient};
use crate::models::{
    ChatReply, ChatRequest, DownloadFile, Itinerary, ItineraryRequest, WeatherReport,
    parse_start_date,
};
use crate::orchestrator::Orchestrator;
use crate::places::{GooglePlacesClient, PlacesProvider};
use crate::weather::{OpenMeteoClient, WeatherService};
use crate::{Result, TravelAgentError, VERSION};

/// Collaborators shared by all handlers
#[derive(Clone)]
pub struct AppState {
    orchestrator: Orchestrator,
    defaults: DefaultsConfig,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, defaults: DefaultsConfig) -> Self {
        Self {
            orchestrator,
            defaults,
        }
    }

    /// Wire the real provider clients from configuration
    pub fn from_config(config: &TravelAgentConfig) -> anyhow::Result<Self> {
        let weather_client = build_client(
            Duration::from_secs(config.weather.timeout_seconds.into()),
            config.weather.max_retries,
        )?;
        let llm_client = build_client(
            Duration::from_secs(config.llm.timeout_seconds.into()),
            config.llm.max_retries,
        )?;
        // Places only enrich the plan, a failed lookup is not retried
        let places_client =
            build_client(Duration::from_secs(config.places.timeout_seconds.into()), 0)?;

        let weather = WeatherService::new(OpenMeteoClient::new(weather_client, &config.weather));
        let llm: Arc<dyn LlmProvider> = Arc::new(OpenAiClient::new(llm_client, &config.llm));
        let places: Arc<dyn PlacesProvider> =
            Arc::new(GooglePlacesClient::new(places_client, &config.places));

        Ok(Self::new(
            Orchestrator::new(config, weather, llm, places),
            config.defaults.clone(),
        ))
    }

    /// Out-of-range requests are pulled into `1..=max_trip_days`, never rejected
    fn clamp_days(&self, days: Option<i64>) -> u32 {
        let max = self.defaults.max_trip_days;
        days.map_or(self.defaults.trip_days, |days| {
            u32::try_from(days.clamp(1, i64::from(max))).unwrap_or(max)
        })
        .clamp(1, max)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/weather", get(weather))
        .route("/itinerary", post(itinerary))
        .route("/download/txt", post(download_txt))
        .route("/download/ics", post(download_ics))
        .with_state(state)
}

#[derive(Serialize)]
struct Health {
    ok: bool,
    time: String,
    version: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        ok: true,
        time: Utc::now().to_rfc3339(),
        version: VERSION,
    })
}

#[instrument(skip_all)]
async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>> {
    let Json(request) = payload.map_err(|e| {
        TravelAgentError::validation(format!("Solicitud inválida: {}", e.body_text()))
    })?;
    let reply = state.orchestrator.handle(request).await?;
    Ok(Json(reply))
}

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    city: Option<String>,
    days: Option<String>,
    start_date: Option<String>,
}

fn parse_days(raw: Option<&str>) -> Result<Option<i64>> {
    match raw.map(str::trim).filter(|days| !days.is_empty()) {
        None => Ok(None),
        Some(days) => days
            .parse()
            .map(Some)
            .map_err(|_| TravelAgentError::validation("days debe ser un número entero")),
    }
}

#[instrument(skip_all)]
async fn weather(
    State(state): State<AppState>,
    query: std::result::Result<Query<WeatherQuery>, QueryRejection>,
) -> Result<Json<WeatherReport>> {
    let Query(query) = query.map_err(|_| TravelAgentError::validation("Parámetros inválidos"))?;
    let city = query.city.as_deref().map(str::trim).unwrap_or_default();
    if city.is_empty() {
        return Err(TravelAgentError::validation("Falta el parámetro city"));
    }

    let days = state.clamp_days(parse_days(query.days.as_deref())?);
    let report = state
        .orchestrator
        .weather()
        .report(city, query.start_date.as_deref(), days)
        .await?;
    Ok(Json(report))
}

#[instrument(skip_all)]
async fn itinerary(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ItineraryRequest>, JsonRejection>,
) -> Result<Json<Itinerary>> {
    let invalid = || TravelAgentError::validation("Parámetros inválidos");
    let Json(request) = payload.map_err(|_| invalid())?;

    // A missing or malformed key is a bad request shape on this route
    let keys = request.keys();
    keys.validate().map_err(|_| invalid())?;
    let city = request.city.trim();
    if city.is_empty() {
        return Err(invalid());
    }
    parse_start_date(request.start_date.as_deref())?;

    let days = state.clamp_days(request.days);
    let language = request
        .language
        .as_deref()
        .filter(|language| !language.trim().is_empty())
        .unwrap_or(state.defaults.language.as_str())
        .to_string();

    let orchestrator = &state.orchestrator;
    let (report, places) = futures::join!(
        orchestrator
            .weather()
            .report(city, request.start_date.as_deref(), days),
        orchestrator.lookup_places(&keys, city, &language),
    );
    let report = report?;

    let itinerary = orchestrator
        .planner()
        .plan(&keys.openai_api_key, city, &report, &places, days, &language)
        .await?;
    Ok(Json(itinerary))
}

fn itinerary_body(payload: std::result::Result<Json<Value>, JsonRejection>) -> Result<Itinerary> {
    let Json(value) = payload.map_err(|_| TravelAgentError::validation("Itinerario inválido"))?;
    Itinerary::from_value(value)
}

#[instrument(skip_all)]
async fn download_txt(
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<DownloadFile>> {
    let itinerary = itinerary_body(payload)?;
    Ok(Json(render_text(&itinerary)))
}

#[instrument(skip_all)]
async fn download_ics(
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<DownloadFile>> {
    let itinerary = itinerary_body(payload)?;
    Ok(Json(render_ics(&itinerary, Utc::now())?))
}
