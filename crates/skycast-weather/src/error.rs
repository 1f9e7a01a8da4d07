//! Weather client error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Rate limited by weather provider")]
    RateLimited,

    #[error("Weather service unavailable (status {0})")]
    ServiceUnavailable(u16),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl WeatherError {
    /// Map a non-success HTTP status and its body to an error.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => Self::InvalidApiKey,
            404 => Self::LocationNotFound(body),
            429 => Self::RateLimited,
            500..=599 => Self::ServiceUnavailable(status),
            _ => Self::Api {
                status,
                message: body,
            },
        }
    }

    /// User-friendly error message for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(e) if e.is_timeout() => "The request timed out. Please try again.",
            Self::Network(_) => "Unable to connect. Check your internet connection.",
            Self::InvalidApiKey => "Weather API key is invalid. Check settings.",
            Self::LocationNotFound(_) => "Location not found. Check and try again.",
            Self::RateLimited => "Too many requests. Please wait and try again.",
            Self::ServiceUnavailable(_) => "Weather service unavailable. Please try again later.",
            Self::Api { .. } => "Weather service error. Please try again.",
            Self::Parse(_) => "Received an unexpected response. Please try again.",
        }
    }

    /// Whether a user-initiated retry has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RateLimited | Self::ServiceUnavailable(_)
        )
    }
}
