//! Unit conversion and display formatting.
//!
//! Times are formatted in UTC so output depends only on the timestamp.

use chrono::{DateTime, Utc};

use crate::types::TemperatureUnit;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Beaufort-style upper bounds in m/s, checked in order
const WIND_SPEED_LABELS: [(f64, &str); 12] = [
    (0.5, "Calm"),
    (1.5, "Light air"),
    (3.3, "Light breeze"),
    (5.5, "Gentle breeze"),
    (7.9, "Moderate breeze"),
    (10.7, "Fresh breeze"),
    (13.8, "Strong breeze"),
    (17.1, "Moderate gale"),
    (20.7, "Fresh gale"),
    (24.4, "Strong gale"),
    (28.4, "Whole gale"),
    (32.6, "Storm"),
];

const PRECIPITATION_LABELS: [(f64, &str); 4] = [
    (0.1, "No precipitation"),
    (0.3, "Slight chance"),
    (0.6, "Chance"),
    (0.8, "Likely"),
];

/// Convert a Celsius reading to `unit`.
pub fn convert_temperature(celsius: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
    }
}

pub fn unit_symbol(unit: TemperatureUnit) -> &'static str {
    match unit {
        TemperatureUnit::Celsius => "°C",
        TemperatureUnit::Fahrenheit => "°F",
    }
}

/// Rounded temperature with its unit symbol, e.g. `"21°C"`.
pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    // adding 0.0 turns -0 into 0
    let rounded = convert_temperature(celsius, unit).round() + 0.0;
    format!("{}{}", rounded, unit_symbol(unit))
}

/// 16-point compass label for a bearing in degrees.
pub fn wind_direction(degrees: f64) -> &'static str {
    let index = ((degrees / 22.5).round() as i64).rem_euclid(16) as usize;
    COMPASS_POINTS[index]
}

pub fn wind_description(speed: f64) -> &'static str {
    WIND_SPEED_LABELS
        .iter()
        .find(|(limit, _)| speed < *limit)
        .map_or("Hurricane", |&(_, label)| label)
}

pub fn precipitation_description(probability: f64) -> &'static str {
    PRECIPITATION_LABELS
        .iter()
        .find(|(limit, _)| probability < *limit)
        .map_or("High probability", |&(_, label)| label)
}

pub fn weather_icon_url(icon_code: &str) -> String {
    format!("{}/{}@2x.png", ICON_BASE_URL, icon_code)
}

fn from_epoch(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or_default()
}

/// Two-digit 12-hour clock, e.g. `"03:00 PM"`.
pub fn format_time(timestamp: i64) -> String {
    from_epoch(timestamp).format("%I:%M %p").to_string()
}

/// Short weekday, month and day, e.g. `"Mon, Jan 5"`.
pub fn format_date(timestamp: i64) -> String {
    from_epoch(timestamp).format("%a, %b %-d").to_string()
}
