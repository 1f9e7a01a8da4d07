use std::collections::HashMap;

use skycast_weather::{FavoriteCity, ForecastData, TemperatureUnit, WeatherData};

/// Dashboard state. Consumers only ever see clones of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherState {
    /// Current conditions by city key
    pub current_weather: HashMap<String, WeatherData>,
    /// Forecasts by city key
    pub forecasts: HashMap<String, ForecastData>,
    pub favorite_cities: Vec<FavoriteCity>,
    pub temperature_unit: TemperatureUnit,
    pub loading: bool,
    pub error: Option<String>,
    /// Epoch milliseconds of the last successful commit, 0 if never
    pub last_updated: i64,
}

impl WeatherState {
    pub fn is_favorite(&self, key: &str) -> bool {
        self.favorite_cities.iter().any(|f| f.key() == key)
    }

    /// Favorites paired with whatever current conditions are loaded for them
    pub fn dashboard(&self) -> Vec<(&FavoriteCity, Option<&WeatherData>)> {
        self.favorite_cities
            .iter()
            .map(|f| (f, self.current_weather.get(&f.key())))
            .collect()
    }
}
