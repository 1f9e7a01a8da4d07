use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Temperature unit preference. Stored readings are always Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Celsius => "celsius",
            Self::Fahrenheit => "fahrenheit",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "celsius" | "c" => Ok(Self::Celsius),
            "fahrenheit" | "f" => Ok(Self::Fahrenheit),
            other => Err(format!("unknown temperature unit: {}", other)),
        }
    }
}

/// Build the composite key `"<name>-<country>"` used for every per-city map.
///
/// Names containing `-` can collide; the key is not escaped.
pub fn city_key(name: &str, country: &str) -> String {
    format!("{}-{}", name, country)
}

/// A location that can be looked up. Geocoded results carry `id == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl City {
    pub fn key(&self) -> String {
        city_key(&self.name, &self.country)
    }
}

/// A city the user tracks on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteCity {
    #[serde(flatten)]
    pub city: City,
    #[serde(rename = "isFavorite")]
    pub is_favorite: bool,
}

impl FavoriteCity {
    pub fn key(&self) -> String {
        self.city.key()
    }
}

impl From<City> for FavoriteCity {
    fn from(city: City) -> Self {
        Self {
            city,
            is_favorite: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sys {
    pub country: String,
}

/// Temperature (°C), feels-like (°C), humidity (%) and pressure (hPa)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub pressure: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub main: String,
    pub description: String,
    pub icon: String,
}

/// Wind speed (m/s) and direction (degrees)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gust: Option<f64>,
}

/// Current conditions snapshot for one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub id: i64,
    pub name: String,
    pub sys: Sys,
    pub main: MainReadings,
    pub weather: Vec<WeatherCondition>,
    pub wind: Wind,
    /// Visibility in meters; upstream omits it for some stations
    pub visibility: Option<u32>,
    /// Observation time, epoch seconds
    pub dt: i64,
}

impl WeatherData {
    /// First condition descriptor, which upstream treats as the primary one
    pub fn primary_condition(&self) -> Option<&WeatherCondition> {
        self.weather.first()
    }

    /// Replace the reported place name with the one the user looked up
    pub fn with_identity(mut self, city: &City) -> Self {
        self.name = city.name.clone();
        self.sys.country = city.country.clone();
        self
    }
}

/// One 3-hour forecast step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastItem {
    pub dt: i64,
    pub main: MainReadings,
    pub weather: Vec<WeatherCondition>,
    pub wind: Wind,
    /// Probability of precipitation in [0, 1]
    pub pop: f64,
    pub dt_txt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCity {
    pub name: String,
    pub country: String,
}

/// 5-day / 3-hour forecast, ordered by time ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastData {
    pub list: Vec<ForecastItem>,
    pub city: ForecastCity,
}

impl ForecastData {
    pub fn with_identity(mut self, city: &City) -> Self {
        self.city = ForecastCity {
            name: city.name.clone(),
            country: city.country.clone(),
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paris() -> City {
        City {
            id: 0,
            name: "Paris".into(),
            country: "FR".into(),
            lat: 48.85,
            lon: 2.35,
        }
    }

    #[test]
    fn test_city_key() {
        assert_eq!(paris().key(), "Paris-FR");
        assert_eq!(city_key("Tokyo", "JP"), "Tokyo-JP");
    }

    #[test]
    fn test_favorite_serializes_flat_with_flag() {
        let fav = FavoriteCity::from(paris());
        let json = serde_json::to_value(&fav).unwrap();
        assert_eq!(json["name"], "Paris");
        assert_eq!(json["isFavorite"], true);
        assert!(json.get("city").is_none());

        let back: FavoriteCity = serde_json::from_value(json).unwrap();
        assert_eq!(back, fav);
    }

    #[test]
    fn test_temperature_unit_parse() {
        assert_eq!("celsius".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Celsius));
        assert_eq!("Fahrenheit".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Fahrenheit));
        assert_eq!("f".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Fahrenheit));
        assert!("kelvin".parse::<TemperatureUnit>().is_err());
    }

    #[test]
    fn test_temperature_unit_serde_lowercase() {
        let json = serde_json::to_string(&TemperatureUnit::Fahrenheit).unwrap();
        assert_eq!(json, "\"fahrenheit\"");
        assert_eq!(TemperatureUnit::default(), TemperatureUnit::Celsius);
    }
}
