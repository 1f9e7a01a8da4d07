//! OpenWeatherMap API client.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

use skycast_core::{ApiConfig, CacheConfig};

use crate::cache::{cache_key, ResponseCache};
use crate::error::WeatherError;
use crate::types::*;

const USER_AGENT: &str = concat!("SkyCast/", env!("CARGO_PKG_VERSION"));
const SEARCH_LIMIT: u32 = 5;

/// Remote weather operations the store depends on.
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// Current conditions at the given coordinates.
    async fn get_current_weather(&self, lat: f64, lon: f64) -> Result<WeatherData, WeatherError>;

    /// 5-day / 3-hour forecast at the given coordinates.
    async fn get_forecast(&self, lat: f64, lon: f64) -> Result<ForecastData, WeatherError>;

    /// Geocode a free-text query. Failures yield an empty list.
    async fn search_cities(&self, query: &str) -> Vec<City>;
}

// Upstream payloads. Only the fields we keep are declared.

#[derive(Debug, Deserialize)]
struct ApiCurrentResponse {
    id: i64,
    name: String,
    sys: ApiSys,
    main: ApiMain,
    weather: Vec<WeatherCondition>,
    wind: ApiWind,
    visibility: Option<u32>,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct ApiSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct ApiWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
    gust: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ApiForecastResponse {
    list: Vec<ApiForecastItem>,
    city: ApiForecastCity,
}

#[derive(Debug, Deserialize)]
struct ApiForecastItem {
    dt: i64,
    main: ApiMain,
    weather: Vec<WeatherCondition>,
    wind: ApiWind,
    pop: Option<f64>,
    dt_txt: String,
}

#[derive(Debug, Deserialize)]
struct ApiForecastCity {
    name: String,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiGeoResult {
    name: String,
    country: String,
    lat: f64,
    lon: f64,
}

impl From<ApiMain> for MainReadings {
    fn from(m: ApiMain) -> Self {
        Self {
            temp: m.temp,
            feels_like: m.feels_like,
            humidity: m.humidity,
            pressure: m.pressure,
        }
    }
}

impl From<ApiWind> for Wind {
    fn from(w: ApiWind) -> Self {
        Self {
            speed: w.speed,
            deg: w.deg,
            gust: w.gust,
        }
    }
}

impl From<ApiCurrentResponse> for WeatherData {
    fn from(r: ApiCurrentResponse) -> Self {
        Self {
            id: r.id,
            name: r.name,
            sys: Sys {
                country: r.sys.country.unwrap_or_default(),
            },
            main: r.main.into(),
            weather: r.weather,
            wind: r.wind.into(),
            visibility: r.visibility,
            dt: r.dt,
        }
    }
}

impl From<ApiForecastItem> for ForecastItem {
    fn from(item: ApiForecastItem) -> Self {
        Self {
            dt: item.dt,
            main: item.main.into(),
            weather: item.weather,
            wind: item.wind.into(),
            pop: item.pop.unwrap_or(0.0),
            dt_txt: item.dt_txt,
        }
    }
}

impl From<ApiForecastResponse> for ForecastData {
    fn from(r: ApiForecastResponse) -> Self {
        Self {
            list: r.list.into_iter().map(ForecastItem::from).collect(),
            city: ForecastCity {
                name: r.city.name,
                country: r.city.country.unwrap_or_default(),
            },
        }
    }
}

impl From<ApiGeoResult> for City {
    fn from(g: ApiGeoResult) -> Self {
        Self {
            id: 0,
            name: g.name,
            country: g.country,
            lat: g.lat,
            lon: g.lon,
        }
    }
}

/// Weather client backed by OpenWeatherMap, with a response cache per operation.
pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    geo_base_url: String,
    weather_cache: ResponseCache<WeatherData>,
    forecast_cache: ResponseCache<ForecastData>,
}

impl OpenWeatherClient {
    pub fn from_config(api: &ApiConfig, cache: &CacheConfig) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            api_key: api.api_key.clone().unwrap_or_default(),
            base_url: api.base_url.trim_end_matches('/').to_string(),
            geo_base_url: api.geo_base_url.trim_end_matches('/').to_string(),
            weather_cache: ResponseCache::new(cache.ttl()),
            forecast_cache: ResponseCache::new(cache.ttl()),
        })
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(WeatherError::from_status(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))
    }

    fn coordinate_query(lat: f64, lon: f64) -> [(&'static str, String); 3] {
        [
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("units", "metric".to_string()),
        ]
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    #[instrument(skip(self), level = "info")]
    async fn get_current_weather(&self, lat: f64, lon: f64) -> Result<WeatherData, WeatherError> {
        let key = cache_key("weather", lat, lon);
        if let Some(cached) = self.weather_cache.get(&key) {
            tracing::debug!("Cache hit: {}", key);
            return Ok(cached);
        }

        let url = format!("{}/weather", self.base_url);
        let result = self
            .fetch_json::<ApiCurrentResponse>(&url, &Self::coordinate_query(lat, lon))
            .await;

        match result {
            Ok(raw) => {
                let data = WeatherData::from(raw);
                self.weather_cache.insert(key, data.clone());
                Ok(data)
            }
            Err(e) => {
                tracing::error!("Current weather fetch failed: {}", e);
                Err(e)
            }
        }
    }

    #[instrument(skip(self), level = "info")]
    async fn get_forecast(&self, lat: f64, lon: f64) -> Result<ForecastData, WeatherError> {
        let key = cache_key("forecast", lat, lon);
        if let Some(cached) = self.forecast_cache.get(&key) {
            tracing::debug!("Cache hit: {}", key);
            return Ok(cached);
        }

        let url = format!("{}/forecast", self.base_url);
        let result = self
            .fetch_json::<ApiForecastResponse>(&url, &Self::coordinate_query(lat, lon))
            .await;

        match result {
            Ok(raw) => {
                let data = ForecastData::from(raw);
                self.forecast_cache.insert(key, data.clone());
                Ok(data)
            }
            Err(e) => {
                tracing::error!("Forecast fetch failed: {}", e);
                Err(e)
            }
        }
    }

    #[instrument(skip(self), level = "info")]
    async fn search_cities(&self, query: &str) -> Vec<City> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let url = format!("{}/direct", self.geo_base_url);
        let params = [
            ("q", query.to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
        ];

        match self.fetch_json::<Vec<ApiGeoResult>>(&url, &params).await {
            Ok(results) => results.into_iter().map(City::from).collect(),
            Err(e) => {
                tracing::warn!("City search failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_response_normalizes() {
        let raw: ApiCurrentResponse = serde_json::from_value(serde_json::json!({
            "coord": {"lon": 2.35, "lat": 48.85},
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
            "base": "stations",
            "main": {"temp": 18.2, "feels_like": 17.6, "temp_min": 16.0, "temp_max": 19.5,
                     "pressure": 1016, "humidity": 58},
            "visibility": 10000,
            "wind": {"speed": 3.6, "deg": 250},
            "dt": 1_717_000_000,
            "sys": {"type": 2, "country": "FR", "sunrise": 1, "sunset": 2},
            "id": 2_988_507,
            "name": "Paris",
            "cod": 200
        }))
        .unwrap();

        let data = WeatherData::from(raw);
        assert_eq!(data.sys.country, "FR");
        assert_eq!(data.main.humidity, 58);
        assert_eq!(data.wind.deg, 250.0);
        assert_eq!(data.wind.gust, None);
        assert_eq!(data.visibility, Some(10000));
        assert_eq!(data.primary_condition().map(|c| c.icon.as_str()), Some("01d"));
    }

    #[test]
    fn test_forecast_item_defaults_missing_pop() {
        let raw: ApiForecastItem = serde_json::from_value(serde_json::json!({
            "dt": 1_717_005_600,
            "main": {"temp": 15.0, "feels_like": 14.1, "pressure": 1014, "humidity": 70},
            "weather": [{"main": "Rain", "description": "light rain", "icon": "10n"}],
            "wind": {"speed": 5.1, "deg": 200, "gust": 9.3},
            "dt_txt": "2024-05-29 18:00:00"
        }))
        .unwrap();

        let item = ForecastItem::from(raw);
        assert_eq!(item.pop, 0.0);
        assert_eq!(item.wind.gust, Some(9.3));
    }

    #[test]
    fn test_geocode_result_reports_zero_id() {
        let raw: ApiGeoResult = serde_json::from_value(serde_json::json!({
            "name": "Tokyo", "local_names": {"ja": "東京都"},
            "lat": 35.68, "lon": 139.69, "country": "JP", "state": "Tokyo"
        }))
        .unwrap();

        let city = City::from(raw);
        assert_eq!(city.id, 0);
        assert_eq!(city.key(), "Tokyo-JP");
    }
}
