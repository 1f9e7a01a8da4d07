//! Series shaping for the city detail charts.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::types::{ForecastData, TemperatureUnit};
use crate::units::{convert_temperature, format_date, format_time, wind_direction};

/// Number of 3-hour steps the short-range charts cover (24 hours)
pub const SHORT_RANGE_STEPS: usize = 8;

/// Number of days the precipitation chart covers
pub const PRECIPITATION_DAYS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperaturePoint {
    pub time: String,
    pub temperature: f64,
    pub feels_like: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindPoint {
    pub time: String,
    pub speed: f64,
    pub direction: f64,
    pub direction_label: &'static str,
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPrecipitation {
    pub date: NaiveDate,
    pub label: String,
    /// Highest probability of any step that day
    pub probability: f64,
}

pub fn temperature_series(forecast: &ForecastData, unit: TemperatureUnit) -> Vec<TemperaturePoint> {
    forecast
        .list
        .iter()
        .take(SHORT_RANGE_STEPS)
        .map(|item| TemperaturePoint {
            time: format_time(item.dt),
            temperature: convert_temperature(item.main.temp, unit),
            feels_like: convert_temperature(item.main.feels_like, unit),
        })
        .collect()
}

pub fn wind_series(forecast: &ForecastData) -> Vec<WindPoint> {
    forecast
        .list
        .iter()
        .take(SHORT_RANGE_STEPS)
        .map(|item| WindPoint {
            time: format_time(item.dt),
            speed: item.wind.speed,
            direction: item.wind.deg,
            direction_label: wind_direction(item.wind.deg),
            gust: item.wind.gust,
        })
        .collect()
}

/// Group forecast steps by UTC day, keeping days in first-seen order.
///
/// At most [`PRECIPITATION_DAYS`] days are returned.
pub fn daily_precipitation(forecast: &ForecastData) -> Vec<DailyPrecipitation> {
    let mut days: Vec<DailyPrecipitation> = Vec::new();

    for item in &forecast.list {
        let date = DateTime::from_timestamp(item.dt, 0)
            .unwrap_or_default()
            .date_naive();

        match days.iter_mut().find(|d| d.date == date) {
            Some(day) => {
                if item.pop > day.probability {
                    day.probability = item.pop;
                }
            }
            None => days.push(DailyPrecipitation {
                date,
                label: format_date(item.dt),
                probability: item.pop,
            }),
        }
    }

    days.truncate(PRECIPITATION_DAYS);
    days
}
