//! Integration tests for OpenWeatherClient using wiremock.

use skycast_core::{ApiConfig, CacheConfig};
use skycast_weather::{OpenWeatherClient, WeatherApi, WeatherError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, ttl_minutes: u64) -> OpenWeatherClient {
    let api = ApiConfig {
        api_key: Some("test-key".to_string()),
        base_url: server.uri(),
        geo_base_url: format!("{}/geo", server.uri()),
        request_timeout_secs: 5,
    };
    OpenWeatherClient::from_config(&api, &CacheConfig { ttl_minutes }).unwrap()
}

fn current_body(temp: f64) -> serde_json::Value {
    serde_json::json!({
        "weather": [{"id": 801, "main": "Clouds", "description": "few clouds", "icon": "02d"}],
        "main": {"temp": temp, "feels_like": temp - 1.0, "pressure": 1012, "humidity": 64},
        "visibility": 10000,
        "wind": {"speed": 4.1, "deg": 230, "gust": 7.2},
        "dt": 1_717_000_000,
        "sys": {"country": "FR"},
        "id": 2_988_507,
        "name": "Paris"
    })
}

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "cod": "200",
        "cnt": 2,
        "list": [
            {
                "dt": 1_717_002_000,
                "main": {"temp": 17.0, "feels_like": 16.5, "pressure": 1013, "humidity": 60},
                "weather": [{"main": "Clear", "description": "clear sky", "icon": "01d"}],
                "wind": {"speed": 3.0, "deg": 180},
                "pop": 0.35,
                "dt_txt": "2024-05-29 17:00:00"
            },
            {
                "dt": 1_717_012_800,
                "main": {"temp": 14.0, "feels_like": 13.2, "pressure": 1014, "humidity": 72},
                "weather": [{"main": "Clouds", "description": "overcast clouds", "icon": "04n"}],
                "wind": {"speed": 2.1, "deg": 170},
                "dt_txt": "2024-05-29 20:00:00"
            }
        ],
        "city": {"id": 2_988_507, "name": "Paris", "country": "FR", "timezone": 7200}
    })
}

#[tokio::test]
async fn test_current_weather_second_call_hits_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "48.85"))
        .and(query_param("lon", "2.35"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(18.0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 10);
    let first = client.get_current_weather(48.85, 2.35).await.unwrap();
    let second = client.get_current_weather(48.85, 2.35).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.name, "Paris");
    assert_eq!(first.main.temp, 18.0);
    assert_eq!(first.wind.gust, Some(7.2));
}

#[tokio::test]
async fn test_expired_entry_refetches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(18.0)))
        .expect(2)
        .mount(&mock_server)
        .await;

    // zero-minute window: every entry is already stale
    let client = client_for(&mock_server, 0);
    client.get_current_weather(48.85, 2.35).await.unwrap();
    client.get_current_weather(48.85, 2.35).await.unwrap();
}

#[tokio::test]
async fn test_distinct_coordinates_are_cached_separately() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(20.0)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 10);
    client.get_current_weather(48.85, 2.35).await.unwrap();
    client.get_current_weather(35.68, 139.69).await.unwrap();
    client.get_current_weather(48.85, 2.35).await.unwrap();
}

#[tokio::test]
async fn test_forecast_normalizes_and_caches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 10);
    let forecast = client.get_forecast(48.85, 2.35).await.unwrap();

    assert_eq!(forecast.list.len(), 2);
    assert_eq!(forecast.list[0].pop, 0.35);
    assert_eq!(forecast.list[1].pop, 0.0);
    assert_eq!(forecast.city.country, "FR");

    let cached = client.get_forecast(48.85, 2.35).await.unwrap();
    assert_eq!(cached, forecast);
}

#[tokio::test]
async fn test_weather_and_forecast_use_separate_cache_keys() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(18.0)))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 10);
    client.get_current_weather(48.85, 2.35).await.unwrap();
    client.get_forecast(48.85, 2.35).await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_maps_to_invalid_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key."
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 10);
    let err = client.get_current_weather(48.85, 2.35).await.unwrap_err();

    assert!(matches!(err, WeatherError::InvalidApiKey), "got {:?}", err);
}

#[tokio::test]
async fn test_failed_fetch_is_not_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 10);
    let first = client.get_forecast(48.85, 2.35).await.unwrap_err();
    assert!(matches!(first, WeatherError::ServiceUnavailable(503)));
    assert!(client.get_forecast(48.85, 2.35).await.is_err());
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Paris"
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 10);
    let err = client.get_current_weather(48.85, 2.35).await.unwrap_err();

    assert!(matches!(err, WeatherError::Parse(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_search_empty_query_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 10);
    assert!(client.search_cities("").await.is_empty());
    assert!(client.search_cities("   ").await.is_empty());

    let received = mock_server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[tokio::test]
async fn test_search_returns_geocoded_cities() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/direct"))
        .and(query_param("q", "Paris"))
        .and(query_param("limit", "5"))
        .and(query_param("appid", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "Paris", "lat": 48.8589, "lon": 2.32, "country": "FR", "state": "Ile-de-France"},
            {"name": "Paris", "lat": 33.66, "lon": -95.55, "country": "US", "state": "Texas"}
        ])))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 10);
    let cities = client.search_cities("Paris").await;

    assert_eq!(cities.len(), 2);
    assert_eq!(cities[0].key(), "Paris-FR");
    assert_eq!(cities[1].key(), "Paris-US");
    assert!(cities.iter().all(|c| c.id == 0));
}

#[tokio::test]
async fn test_search_failure_yields_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/direct"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 10);
    assert!(client.search_cities("Paris").await.is_empty());
}
