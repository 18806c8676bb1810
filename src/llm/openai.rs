//! Client for OpenAI-compatible `/chat/completions` endpoints

use std::time::Instant;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, instrument, warn};

use super::{JsonSchemaFormat, LlmProvider};
use crate::config::LlmConfig;
use crate::http::join_url;
use crate::models::ChatMessage;
use crate::{Result, TravelAgentError};

pub struct OpenAiClient {
    client: ClientWithMiddleware,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}

impl OpenAiClient {
    pub fn new(client: ClientWithMiddleware, config: &LlmConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        }
    }

    fn completions_url(&self) -> String {
        join_url(&self.base_url, "chat/completions")
    }
}

fn response_format(schema: &JsonSchemaFormat) -> Value {
    json!({
        "type": "json_schema",
        "json_schema": schema,
    })
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.model, messages = messages.len()))]
    async fn complete(
        &self,
        api_key: &str,
        messages: &[ChatMessage],
        schema: Option<&JsonSchemaFormat>,
    ) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            response_format: schema.map(response_format),
        };

        let start_time = Instant::now();
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(status = %status, body = %body, "LLM API error");

            return Err(match status {
                StatusCode::UNAUTHORIZED => {
                    TravelAgentError::unauthorized("La OPENAI_API_KEY fue rechazada por el proveedor.")
                }
                _ => TravelAgentError::upstream(format!("LLM provider returned {status}: {body}")),
            });
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            TravelAgentError::upstream(format!("Failed to parse LLM response: {e}"))
        })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TravelAgentError::upstream("LLM response had no choices"))?;

        debug!(
            finish_reason = choice.finish_reason.as_deref().unwrap_or("?"),
            elapsed = start_time.elapsed().as_secs_f64(),
            "LLM response received"
        );

        if let Some(refusal) = choice.message.refusal {
            warn!("LLM refused the request: {}", refusal);
            return Err(TravelAgentError::upstream(format!(
                "El modelo rechazó la solicitud: {refusal}"
            )));
        }

        // Blank chat answers are handled by the caller; structured output must have content
        match choice.message.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ if schema.is_none() => Ok(String::new()),
            _ => Err(TravelAgentError::upstream("LLM returned an empty response")),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
