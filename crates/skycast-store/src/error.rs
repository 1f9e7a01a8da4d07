use skycast_weather::WeatherError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Weather(e) => e.user_message(),
            Self::Storage(_) | Self::Io(_) => "Failed to save your settings. Please try again.",
            Self::Serialization(_) => "Saved settings could not be read.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_error_message_passes_through() {
        let err: StoreError = WeatherError::InvalidApiKey.into();
        assert_eq!(err.to_string(), "Invalid API key");
        assert_eq!(err.user_message(), WeatherError::InvalidApiKey.user_message());
    }

    #[test]
    fn test_storage_error_message() {
        let err = StoreError::storage("disk full");
        assert!(err.to_string().contains("disk full"));
        assert!(err.user_message().contains("save"));
    }
}
