//! The dashboard state container and its action set.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

use skycast_weather::{City, FavoriteCity, TemperatureUnit, WeatherApi};

use crate::error::StoreError;
use crate::state::WeatherState;
use crate::storage::{KeyValueStorage, FAVORITES_KEY, TEMPERATURE_UNIT_KEY};

/// Outcome of a bulk favorites refresh. Keys follow the order they were requested in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    pub updated: Vec<String>,
    pub failed: Vec<FailedRefresh>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedRefresh {
    pub key: String,
    pub message: String,
}

/// Mutable state plus bookkeeping for in-flight fetches.
///
/// Every fetch takes a sequence number at dispatch; a result is committed for
/// a key only if its number is newer than the last one committed there. A
/// failure is recorded only by the latest request dispatched for its key.
#[derive(Default)]
struct Inner {
    state: WeatherState,
    in_flight: usize,
    next_seq: u64,
    dispatched_seq: HashMap<String, u64>,
    weather_seq: HashMap<String, u64>,
    forecast_seq: HashMap<String, u64>,
}

impl Inner {
    fn next_sequence(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn accept(committed: &mut HashMap<String, u64>, key: &str, seq: u64) -> bool {
        match committed.get(key) {
            Some(&last) if last >= seq => false,
            _ => {
                committed.insert(key.to_string(), seq);
                true
            }
        }
    }
}

const INCOMPLETE_REFRESH: &str = "Refresh did not complete. Please try again.";

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub struct WeatherStore {
    api: Arc<dyn WeatherApi>,
    storage: Arc<dyn KeyValueStorage>,
    inner: Mutex<Inner>,
}

impl WeatherStore {
    /// Build the store, restoring favorites and the unit preference from `storage`.
    pub fn new(api: Arc<dyn WeatherApi>, storage: Arc<dyn KeyValueStorage>) -> Self {
        let state = WeatherState {
            favorite_cities: load_favorites(storage.as_ref()),
            temperature_unit: load_unit(storage.as_ref()),
            ..WeatherState::default()
        };

        tracing::info!(
            "Weather store ready with {} favorites ({})",
            state.favorite_cities.len(),
            state.temperature_unit
        );

        Self {
            api,
            storage,
            inner: Mutex::new(Inner {
                state,
                ..Inner::default()
            }),
        }
    }

    pub fn snapshot(&self) -> WeatherState {
        self.inner.lock().state.clone()
    }

    pub fn favorites(&self) -> Vec<FavoriteCity> {
        self.inner.lock().state.favorite_cities.clone()
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.inner.lock().state.temperature_unit
    }

    /// Fetch current weather and forecast for one city and commit both together.
    ///
    /// On failure the error message is recorded and any data already held for
    /// the city is left as it was.
    pub async fn fetch_by_city(&self, city: &City) -> Result<(), StoreError> {
        let key = city.key();
        let seq = {
            let mut inner = self.inner.lock();
            inner.in_flight += 1;
            inner.state.loading = true;
            inner.state.error = None;
            let seq = inner.next_sequence();
            inner.dispatched_seq.insert(key.clone(), seq);
            seq
        };

        tracing::debug!("Fetching {} (request {})", key, seq);
        let result = tokio::try_join!(
            self.api.get_current_weather(city.lat, city.lon),
            self.api.get_forecast(city.lat, city.lon),
        );

        let mut inner = self.inner.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        inner.state.loading = inner.in_flight > 0;

        match result {
            Ok((weather, forecast)) => {
                let commit_weather = Inner::accept(&mut inner.weather_seq, &key, seq);
                let commit_forecast = Inner::accept(&mut inner.forecast_seq, &key, seq);

                if commit_weather {
                    inner
                        .state
                        .current_weather
                        .insert(key.clone(), weather.with_identity(city));
                }
                if commit_forecast {
                    inner
                        .state
                        .forecasts
                        .insert(key.clone(), forecast.with_identity(city));
                }
                if commit_weather || commit_forecast {
                    inner.state.last_updated = now_millis();
                } else {
                    tracing::debug!("Discarding superseded response for {}", key);
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to fetch weather for {}: {}", key, e);
                if inner.dispatched_seq.get(&key).is_some_and(|&latest| latest > seq) {
                    tracing::debug!("Not recording error from superseded request for {}", key);
                } else {
                    inner.state.error = Some(e.user_message().to_string());
                }
                Err(e.into())
            }
        }
    }

    /// Refresh current weather (no forecasts) for every city in `cities`.
    ///
    /// Cities are fetched concurrently and committed in one step once all have
    /// settled. A failing city does not hold back the others, and the global
    /// `loading`/`error` flags are left alone.
    pub async fn fetch_for_favorites(&self, cities: &[FavoriteCity]) -> RefreshReport {
        if cities.is_empty() {
            return RefreshReport::default();
        }

        let seq = self.inner.lock().next_sequence();
        let mut tasks = JoinSet::new();

        for (index, favorite) in cities.iter().enumerate() {
            let api = Arc::clone(&self.api);
            let city = favorite.city.clone();
            tasks.spawn(async move {
                let result = api.get_current_weather(city.lat, city.lon).await;
                (index, city, result)
            });
        }

        let mut fetched = Vec::new();
        let mut failed = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, city, Ok(weather))) => {
                    fetched.push((index, city.key(), weather.with_identity(&city)));
                }
                Ok((index, city, Err(e))) => {
                    tracing::warn!("Refresh failed for {}: {}", city.key(), e);
                    failed.push((
                        index,
                        FailedRefresh {
                            key: city.key(),
                            message: e.user_message().to_string(),
                        },
                    ));
                }
                Err(e) => tracing::error!("Refresh task did not complete: {}", e),
            }
        }

        // a task that panicked reported nothing; account for its city here
        for (index, favorite) in cities.iter().enumerate() {
            let settled = fetched.iter().any(|(i, _, _)| *i == index)
                || failed.iter().any(|(i, _)| *i == index);
            if !settled {
                failed.push((
                    index,
                    FailedRefresh {
                        key: favorite.key(),
                        message: INCOMPLETE_REFRESH.to_string(),
                    },
                ));
            }
        }

        fetched.sort_by_key(|(index, _, _)| *index);
        failed.sort_by_key(|(index, _)| *index);

        let mut report = RefreshReport::default();
        {
            let mut inner = self.inner.lock();
            for (_, key, weather) in fetched {
                if Inner::accept(&mut inner.weather_seq, &key, seq) {
                    inner.state.current_weather.insert(key.clone(), weather);
                    report.updated.push(key);
                } else {
                    tracing::debug!("Discarding superseded refresh for {}", key);
                }
            }
            if !report.updated.is_empty() {
                inner.state.last_updated = now_millis();
            }
        }
        report.failed = failed.into_iter().map(|(_, f)| f).collect();

        tracing::info!(
            "Refreshed {} of {} favorites",
            report.updated.len(),
            cities.len()
        );
        report
    }

    /// Refresh current weather for the store's own favorites.
    pub async fn refresh_favorites(&self) -> RefreshReport {
        let favorites = self.favorites();
        self.fetch_for_favorites(&favorites).await
    }

    /// Append `city` to favorites and persist the list.
    ///
    /// Returns `Ok(false)` without writing if a favorite with the same key exists.
    pub fn add_favorite(&self, city: City) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        let key = city.key();

        if inner.state.is_favorite(&key) {
            tracing::debug!("{} is already a favorite", key);
            return Ok(false);
        }

        let mut next = inner.state.favorite_cities.clone();
        next.push(FavoriteCity::from(city));
        self.persist_favorites(&next)?;
        inner.state.favorite_cities = next;

        tracing::info!("Added favorite {}", key);
        Ok(true)
    }

    /// Drop the favorite with exactly this key and persist the list.
    ///
    /// Loaded weather for the key is kept in memory.
    pub fn remove_favorite(&self, key: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();

        let next: Vec<FavoriteCity> = inner
            .state
            .favorite_cities
            .iter()
            .filter(|f| f.key() != key)
            .cloned()
            .collect();
        let removed = next.len() != inner.state.favorite_cities.len();

        self.persist_favorites(&next)?;
        inner.state.favorite_cities = next;

        if removed {
            tracing::info!("Removed favorite {}", key);
        }
        Ok(removed)
    }

    /// Set and persist the display unit. Stored readings are not refetched.
    pub fn set_temperature_unit(&self, unit: TemperatureUnit) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.storage.set(TEMPERATURE_UNIT_KEY, unit.as_str())?;
        inner.state.temperature_unit = unit;
        Ok(())
    }

    pub fn clear_error(&self) {
        self.inner.lock().state.error = None;
    }

    pub async fn search_cities(&self, query: &str) -> Vec<City> {
        self.api.search_cities(query).await
    }

    fn persist_favorites(&self, favorites: &[FavoriteCity]) -> Result<(), StoreError> {
        let json = serde_json::to_string(favorites)?;
        self.storage.set(FAVORITES_KEY, &json)
    }
}

fn load_favorites(storage: &dyn KeyValueStorage) -> Vec<FavoriteCity> {
    let raw = match storage.get(FAVORITES_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!("Could not read favorites: {}", e);
            return Vec::new();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!("Discarding unreadable favorites: {}", e);
        Vec::new()
    })
}

fn load_unit(storage: &dyn KeyValueStorage) -> TemperatureUnit {
    match storage.get(TEMPERATURE_UNIT_KEY) {
        Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!("{}; using default", e);
            TemperatureUnit::default()
        }),
        Ok(None) => TemperatureUnit::default(),
        Err(e) => {
            tracing::warn!("Could not read temperature unit: {}", e);
            TemperatureUnit::default()
        }
    }
}
