//! Configuration management for the travel agent service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TravelAgentError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the travel agent service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelAgentConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Weather and geocoding API configuration
    pub weather: WeatherConfig,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Places search configuration
    pub places: PlacesConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Default trip settings
    pub defaults: DefaultsConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, `*` allows any
    pub cors_origins: Vec<String>,
    pub request_timeout_seconds: u32,
    pub body_limit_kb: u32,
    /// Directory with a built browser UI, served as fallback when set
    pub static_dir: Option<String>,
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base URL for the forecast API
    pub forecast_base_url: String,
    /// Base URL for the geocoding API
    pub geocoding_base_url: String,
    /// Language used for geocoding results
    pub geocoding_language: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    pub max_retries: u32,
}

/// LLM provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u32,
    /// Retries for transient provider failures
    pub max_retries: u32,
    /// Chat messages longer than this are truncated
    pub max_message_chars: usize,
    /// Only the most recent history messages are forwarded
    pub max_history_messages: usize,
}

/// Places search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    pub base_url: String,
    pub timeout_seconds: u32,
    pub max_results: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
    /// OTLP/HTTP collector endpoint; export is disabled when unset
    pub otlp_endpoint: Option<String>,
}

/// Default trip settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Trip length when the caller does not give one
    pub trip_days: u32,
    /// Response language when the caller does not give one
    pub language: String,
    /// Longest trip the forecast can cover
    pub max_trip_days: u32,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u32 {
    120
}

fn default_body_limit() -> u32 {
    256
}

fn default_forecast_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_geocoding_base_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_geocoding_language() -> String {
    "es".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_weather_max_retries() -> u32 {
    3
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_llm_timeout() -> u32 {
    90
}

fn default_llm_max_retries() -> u32 {
    1
}

fn default_max_message_chars() -> usize {
    4000
}

fn default_max_history_messages() -> usize {
    20
}

fn default_places_base_url() -> String {
    "https://places.googleapis.com/v1".to_string()
}

fn default_places_timeout() -> u32 {
    20
}

fn default_places_max_results() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_trip_days() -> u32 {
    3
}

fn default_language() -> String {
    "es".to_string()
}

fn default_max_trip_days() -> u32 {
    14
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec!["*".to_string()],
            request_timeout_seconds: default_request_timeout(),
            body_limit_kb: default_body_limit(),
            static_dir: None,
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            forecast_base_url: default_forecast_base_url(),
            geocoding_base_url: default_geocoding_base_url(),
            geocoding_language: default_geocoding_language(),
            timeout_seconds: default_weather_timeout(),
            max_retries: default_weather_max_retries(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            timeout_seconds: default_llm_timeout(),
            max_retries: default_llm_max_retries(),
            max_message_chars: default_max_message_chars(),
            max_history_messages: default_max_history_messages(),
        }
    }
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            base_url: default_places_base_url(),
            timeout_seconds: default_places_timeout(),
            max_results: default_places_max_results(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            trip_days: default_trip_days(),
            language: default_language(),
            max_trip_days: default_max_trip_days(),
        }
    }
}

impl TravelAgentConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRAVELAGENT_SERVER__PORT=9000 overrides server.port
        builder = builder.add_source(
            Environment::with_prefix("TRAVELAGENT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TravelAgentConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("travel-agent").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
        if self.server.cors_origins.is_empty() {
            self.server.cors_origins = vec!["*".to_string()];
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.server.body_limit_kb == 0 {
            self.server.body_limit_kb = default_body_limit();
        }
        if self.weather.forecast_base_url.is_empty() {
            self.weather.forecast_base_url = default_forecast_base_url();
        }
        if self.weather.geocoding_base_url.is_empty() {
            self.weather.geocoding_base_url = default_geocoding_base_url();
        }
        if self.weather.geocoding_language.is_empty() {
            self.weather.geocoding_language = default_geocoding_language();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.llm.base_url.is_empty() {
            self.llm.base_url = default_llm_base_url();
        }
        if self.llm.model.is_empty() {
            self.llm.model = default_llm_model();
        }
        if self.llm.timeout_seconds == 0 {
            self.llm.timeout_seconds = default_llm_timeout();
        }
        if self.llm.max_message_chars == 0 {
            self.llm.max_message_chars = default_max_message_chars();
        }
        if self.places.base_url.is_empty() {
            self.places.base_url = default_places_base_url();
        }
        if self.places.timeout_seconds == 0 {
            self.places.timeout_seconds = default_places_timeout();
        }
        if self.places.max_results == 0 {
            self.places.max_results = default_places_max_results();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.trip_days == 0 {
            self.defaults.trip_days = default_trip_days();
        }
        if self.defaults.language.is_empty() {
            self.defaults.language = default_language();
        }
        if self.defaults.max_trip_days == 0 {
            self.defaults.max_trip_days = default_max_trip_days();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_tls()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(
                TravelAgentError::config("Weather API timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.weather.max_retries > 10 {
            return Err(TravelAgentError::config("Weather API max retries cannot exceed 10").into());
        }

        if self.llm.max_retries > 5 {
            return Err(TravelAgentError::config("LLM max retries cannot exceed 5").into());
        }

        if self.llm.timeout_seconds > 600 {
            return Err(TravelAgentError::config("LLM timeout cannot exceed 600 seconds").into());
        }

        if self.places.max_results > 20 {
            return Err(TravelAgentError::config("Places max results cannot exceed 20").into());
        }

        // Open-Meteo forecasts reach 16 days ahead
        if self.defaults.max_trip_days > 16 {
            return Err(TravelAgentError::config("Maximum trip length cannot exceed 16 days").into());
        }

        if self.defaults.trip_days > self.defaults.max_trip_days {
            return Err(TravelAgentError::config(format!(
                "Default trip length {} exceeds the maximum of {} days",
                self.defaults.trip_days, self.defaults.max_trip_days
            ))
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TravelAgentError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TravelAgentError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Weather forecast", Some(&self.weather.forecast_base_url)),
            ("Geocoding", Some(&self.weather.geocoding_base_url)),
            ("LLM", Some(&self.llm.base_url)),
            ("Places", Some(&self.places.base_url)),
            ("OTLP", self.logging.otlp_endpoint.as_ref()),
        ];
        for (name, url) in urls {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(TravelAgentError::config(format!(
                        "{name} base URL must be a valid HTTP or HTTPS URL"
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    fn validate_tls(&self) -> Result<()> {
        match (&self.server.tls_cert_path, &self.server.tls_key_path) {
            (Some(_), None) | (None, Some(_)) => Err(TravelAgentError::config(
                "TLS needs both tls_cert_path and tls_key_path",
            )
            .into()),
            _ => Ok(()),
        }
    }
}
