//! Points-of-interest lookup by city name
//!
//! Places are optional enrichment for the planner. The lookup only runs
//! when the caller supplies a places API key.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::config::PlacesConfig;
use crate::http::join_url;
use crate::models::Place;
use crate::{Result, TravelAgentError};

const FIELD_MASK: &str =
    "places.displayName,places.formattedAddress,places.rating,places.primaryTypeDisplayName";

#[async_trait]
pub trait PlacesProvider: Send + Sync {
    async fn search(&self, api_key: &str, city: &str, language: &str) -> Result<Vec<Place>>;
}

/// Google Places API (New) text search client
pub struct GooglePlacesClient {
    client: ClientWithMiddleware,
    base_url: String,
    max_results: u32,
}

impl GooglePlacesClient {
    pub fn new(client: ClientWithMiddleware, config: &PlacesConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            max_results: config.max_results,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchTextResponse {
    #[serde(default)]
    places: Vec<GooglePlace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GooglePlace {
    display_name: Option<LocalizedText>,
    formatted_address: Option<String>,
    rating: Option<f32>,
    primary_type_display_name: Option<LocalizedText>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

impl GooglePlace {
    fn into_place(self) -> Option<Place> {
        let name = self.display_name?.text;
        Some(Place {
            name,
            address: self.formatted_address,
            rating: self.rating,
            category: self.primary_type_display_name.map(|t| t.text),
        })
    }
}

fn search_query(city: &str, language: &str) -> String {
    if language.starts_with("en") {
        format!("top tourist attractions in {city}")
    } else {
        format!("principales atracciones turísticas en {city}")
    }
}

#[async_trait]
impl PlacesProvider for GooglePlacesClient {
    #[instrument(skip(self, api_key))]
    async fn search(&self, api_key: &str, city: &str, language: &str) -> Result<Vec<Place>> {
        let body = json!({
            "textQuery": search_query(city, language),
            "languageCode": language,
            "maxResultCount": self.max_results,
        });

        let response = self
            .client
            .post(join_url(&self.base_url, "places:searchText"))
            .header("X-Goog-Api-Key", api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    TravelAgentError::unauthorized("Invalid or missing places API key")
                }
                _ => TravelAgentError::upstream(format!(
                    "Places API error {status}: {error_text}"
                )),
            });
        }

        let search: SearchTextResponse = response.json().await.map_err(|e| {
            TravelAgentError::upstream(format!("Failed to parse places response: {e}"))
        })?;

        let places: Vec<Place> = search
            .places
            .into_iter()
            .filter_map(GooglePlace::into_place)
            .take(self.max_results as usize)
            .collect();

        info!("Found {} places for {}", places.len(), city);
        Ok(places)
    }
}
