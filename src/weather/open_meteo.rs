//! Open-Meteo geocoding and daily forecast client

use std::time::Instant;

use chrono::NaiveDate;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::WeatherConfig;
use crate::http::join_url;
use crate::models::{Location, WeatherDay};
use crate::{Result, TravelAgentError};

const DAILY_FIELDS: &str = "weathercode,precipitation_sum,temperature_2m_max,temperature_2m_min";

/// HTTP client for the Open-Meteo APIs (no API key required)
#[derive(Clone)]
pub struct OpenMeteoClient {
    client: ClientWithMiddleware,
    forecast_base_url: String,
    geocoding_base_url: String,
    language: String,
}

impl OpenMeteoClient {
    pub fn new(client: ClientWithMiddleware, config: &WeatherConfig) -> Self {
        Self {
            client,
            forecast_base_url: config.forecast_base_url.clone(),
            geocoding_base_url: config.geocoding_base_url.clone(),
            language: config.geocoding_language.clone(),
        }
    }

    /// Resolve a city name to its best geocoding hit
    #[instrument(skip(self))]
    pub async fn geocode(&self, city: &str) -> Result<Location> {
        let url = format!(
            "{}?name={}&count=1&language={}&format=json",
            join_url(&self.geocoding_base_url, "search"),
            urlencoding::encode(city),
            urlencoding::encode(&self.language)
        );

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let geocoding: GeocodingResponse = response.json().await.map_err(|e| {
            TravelAgentError::upstream(format!("Invalid geocoding response: {e}"))
        })?;

        let hit = geocoding
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| {
                warn!("No results found for location '{}'", city);
                TravelAgentError::not_found(format!("No se encontró la ciudad: {city}"))
            })?;

        debug!(
            "Geocoded '{}' to {} ({:.4}, {:.4})",
            city, hit.name, hit.latitude, hit.longitude
        );
        Ok(hit.into())
    }

    /// Daily forecast for `days` days starting at `start`
    #[instrument(skip(self, location), fields(location = %location.name))]
    pub async fn daily_forecast(
        &self,
        location: &Location,
        start: NaiveDate,
        days: u32,
    ) -> Result<Vec<WeatherDay>> {
        let end = start + chrono::Duration::days(i64::from(days.max(1)) - 1);
        let timezone = if location.timezone.is_empty() {
            "auto"
        } else {
            location.timezone.as_str()
        };

        let url = format!(
            "{}?latitude={}&longitude={}&daily={}&timezone={}&start_date={}&end_date={}",
            join_url(&self.forecast_base_url, "forecast"),
            location.latitude,
            location.longitude,
            DAILY_FIELDS,
            urlencoding::encode(timezone),
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        );

        let start_time = Instant::now();
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let forecast: ForecastResponse = response.json().await.map_err(|e| {
            TravelAgentError::upstream(format!("Invalid forecast response: {e}"))
        })?;

        let days = forecast
            .daily
            .map(DailyData::into_days)
            .unwrap_or_default();

        info!(
            "Retrieved {} forecast days in {:.3}s",
            days.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(days)
    }
}

/// Geocoding response from `OpenMeteo`
#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    timezone: Option<String>,
}

impl From<GeocodingResult> for Location {
    fn from(hit: GeocodingResult) -> Self {
        let mut location = Location::new(hit.latitude, hit.longitude, hit.name)
            .with_timezone(hit.timezone.unwrap_or_else(|| "auto".to_string()));
        location.country = hit.country;
        location
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: Option<DailyData>,
}

/// Daily weather data from `OpenMeteo`
#[derive(Debug, Deserialize)]
struct DailyData {
    time: Vec<String>,
    #[serde(rename = "weathercode")]
    weather_code: Option<Vec<Option<u8>>>,
    #[serde(rename = "temperature_2m_max")]
    temperature_max: Option<Vec<Option<f32>>>,
    #[serde(rename = "temperature_2m_min")]
    temperature_min: Option<Vec<Option<f32>>>,
    precipitation_sum: Option<Vec<Option<f32>>>,
}

fn value_at<T: Copy>(values: &Option<Vec<Option<T>>>, i: usize) -> Option<T> {
    values.as_ref().and_then(|v| v.get(i).copied().flatten())
}

impl DailyData {
    fn into_days(self) -> Vec<WeatherDay> {
        let mut days = Vec::with_capacity(self.time.len());

        for (i, date) in self.time.iter().enumerate() {
            let (Some(code), Some(temp_max), Some(temp_min)) = (
                value_at(&self.weather_code, i),
                value_at(&self.temperature_max, i),
                value_at(&self.temperature_min, i),
            ) else {
                warn!("Skipping forecast day {} with incomplete data", date);
                continue;
            };

            days.push(WeatherDay {
                date: date.clone(),
                code,
                summary: weather_code_to_description(code).to_string(),
                temp_max,
                temp_min,
                precipitation_sum: value_at(&self.precipitation_sum, i).unwrap_or(0.0),
                sunrise: None,
                sunset: None,
            });
        }

        days
    }
}

/// Convert WMO weather code to a Spanish description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "despejado/soleado",
        1 => "mayormente despejado",
        2 => "parcialmente nublado",
        3 => "nublado",
        45 => "niebla",
        48 => "niebla escarchada",
        51 => "llovizna ligera",
        53 => "llovizna moderada",
        55 => "llovizna densa",
        56 => "llovizna helada ligera",
        57 => "llovizna helada densa",
        61 => "lluvia ligera",
        63 => "lluvia moderada",
        65 => "lluvia intensa",
        66 => "lluvia helada ligera",
        67 => "lluvia helada intensa",
        71 => "nieve ligera",
        73 => "nieve moderada",
        75 => "nieve intensa",
        77 => "granizo",
        80 => "chubascos ligeros",
        81 => "chubascos moderados",
        82 => "chubascos fuertes",
        85 => "chubascos de nieve ligeros",
        86 => "chubascos de nieve fuertes",
        95 => "tormenta",
        96 => "tormenta con granizo ligera",
        99 => "tormenta con granizo fuerte",
        _ => "",
    }
}
