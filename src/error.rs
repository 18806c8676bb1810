//! Error types and handling for the travel agent service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Main error type for the travel agent service
#[derive(Error, Debug)]
pub enum TravelAgentError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Missing or rejected provider credentials
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Lookup that returned no result (unknown city, ...)
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// External provider communication errors
    #[error("Upstream error: {message}")]
    Upstream { message: String },

    /// Anything else
    #[error("Internal error: {source}")]
    Internal {
        #[from]
        source: anyhow::Error,
    },
}

impl TravelAgentError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new unauthorized error
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new upstream provider error
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// HTTP status returned to the caller
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            TravelAgentError::Validation { .. } => StatusCode::BAD_REQUEST,
            TravelAgentError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            TravelAgentError::NotFound { .. } => StatusCode::NOT_FOUND,
            TravelAgentError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            TravelAgentError::Config { .. } | TravelAgentError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TravelAgentError::Config { .. } => {
                "Configuration error. Please check the server configuration.".to_string()
            }
            TravelAgentError::Validation { message }
            | TravelAgentError::Unauthorized { message }
            | TravelAgentError::NotFound { message } => message.clone(),
            TravelAgentError::Upstream { message } => {
                format!("Error al contactar un servicio externo: {message}")
            }
            TravelAgentError::Internal { .. } => "Internal server error".to_string(),
        }
    }
}

impl From<reqwest_middleware::Error> for TravelAgentError {
    fn from(err: reqwest_middleware::Error) -> Self {
        Self::upstream(err.to_string())
    }
}

impl From<reqwest::Error> for TravelAgentError {
    fn from(err: reqwest::Error) -> Self {
        Self::upstream(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for TravelAgentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = ErrorBody {
            detail: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}
