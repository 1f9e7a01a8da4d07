//! Weather data for SkyCast
//!
//! Current conditions, 5-day forecasts and city search via the
//! OpenWeatherMap API, with a short-lived in-memory response cache and
//! the display helpers the dashboard uses.

pub mod cache;
pub mod charts;
pub mod client;
pub mod error;
pub mod types;
pub mod units;

pub use cache::{cache_key, CacheEntry, ResponseCache};
pub use client::{OpenWeatherClient, WeatherApi};
pub use error::WeatherError;
pub use types::*;
