//! LLM completion provider abstraction
//!
//! The provider is a black-box text generator. Callers pass their own API
//! key on every request; nothing is stored server-side.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::Result;
use crate::models::ChatMessage;

pub mod openai;

pub use openai::OpenAiClient;

/// Structured output requested from the model
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub schema: Value,
    pub strict: bool,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run a completion and return the assistant text
    async fn complete(
        &self,
        api_key: &str,
        messages: &[ChatMessage],
        schema: Option<&JsonSchemaFormat>,
    ) -> Result<String>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}
