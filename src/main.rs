//! SkyCast: weather for your favorite cities from the terminal.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use skycast_core::{AppError, Config};
use skycast_store::{FileStorage, WeatherState, WeatherStore};
use skycast_weather::charts::{daily_precipitation, temperature_series, wind_series};
use skycast_weather::units::{
    format_temperature, format_time, precipitation_description, wind_description, wind_direction,
};
use skycast_weather::{city_key, City, OpenWeatherClient, TemperatureUnit, WeatherData};

#[derive(Parser)]
#[command(name = "skycast", about = "Current weather and forecasts for your favorite cities")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh and list current weather for all favorites (default)
    Dashboard,
    /// Search for a city by name
    Search { query: String },
    /// Search for a city and add one of the matches to favorites
    Add {
        query: String,
        /// 1-based index into the search results
        #[arg(long, default_value_t = 1)]
        pick: usize,
    },
    /// Remove a favorite by its key, e.g. "Paris-FR"
    Remove { key: String },
    /// Fetch current conditions and forecast for a favorite
    Show { name: String, country: String },
    /// Set the temperature display unit
    Unit { unit: TemperatureUnit },
}

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env is fine; the key can come from the environment or config
    let _ = dotenvy::dotenv();
    skycast_core::init()?;

    let cli = Cli::parse();

    let config = match Config::load_validated() {
        Ok((config, _)) => config,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    };

    let client = OpenWeatherClient::from_config(&config.api, &config.cache)
        .map_err(|e| AppError::Service(e.to_string()))?;
    let storage = FileStorage::open(&config.storage.data_path())
        .map_err(|e| AppError::Service(e.to_string()))?;
    let store = WeatherStore::new(Arc::new(client), Arc::new(storage));

    match cli.command.unwrap_or(Command::Dashboard) {
        Command::Dashboard => dashboard(&store).await,
        Command::Search { query } => {
            let cities = store.search_cities(&query).await;
            if cities.is_empty() {
                println!("No cities found for \"{}\"", query);
            }
            for (i, city) in cities.iter().enumerate() {
                println!("{}. {}  ({:.2}, {:.2})", i + 1, city.key(), city.lat, city.lon);
            }
        }
        Command::Add { query, pick } => {
            let cities = store.search_cities(&query).await;
            let Some(city) = pick.checked_sub(1).and_then(|i| cities.into_iter().nth(i)) else {
                println!("No match #{} for \"{}\"", pick, query);
                return Ok(());
            };
            let key = city.key();
            if store.add_favorite(city)? {
                println!("Added {}", key);
            } else {
                println!("{} is already a favorite", key);
            }
        }
        Command::Remove { key } => {
            if store.remove_favorite(&key)? {
                println!("Removed {}", key);
            } else {
                println!("{} is not a favorite", key);
            }
        }
        Command::Show { name, country } => show(&store, &city_key(&name, &country)).await?,
        Command::Unit { unit } => {
            store.set_temperature_unit(unit)?;
            println!("Temperatures will be shown in {}", unit);
        }
    }

    Ok(())
}

async fn dashboard(store: &WeatherStore) {
    let report = store.refresh_favorites().await;
    let state = store.snapshot();

    if state.favorite_cities.is_empty() {
        println!("No favorites yet. Try `skycast add <city>`.");
        return;
    }

    for (favorite, weather) in state.dashboard() {
        match weather {
            Some(w) => println!("{}", summary_line(w, state.temperature_unit)),
            None => println!("{:<24} no data", favorite.key()),
        }
    }
    for failure in &report.failed {
        eprintln!("{}: {}", failure.key, failure.message);
    }
    println!("Last updated: {}", last_updated(&state));
}

async fn show(store: &WeatherStore, key: &str) -> Result<()> {
    let Some(favorite) = store.favorites().into_iter().find(|f| f.key() == key) else {
        println!("{} is not a favorite", key);
        return Ok(());
    };
    let city: City = favorite.city;

    if let Err(e) = store.fetch_by_city(&city).await {
        eprintln!("{}", e.user_message());
    }
    let state = store.snapshot();
    let unit = state.temperature_unit;

    let Some(weather) = state.current_weather.get(key) else {
        return Ok(());
    };
    println!("{}", summary_line(weather, unit));
    println!(
        "  humidity {}%  pressure {} hPa  visibility {}",
        weather.main.humidity,
        weather.main.pressure,
        weather
            .visibility
            .map_or_else(|| "n/a".to_string(), |v| format!("{:.1} km", f64::from(v) / 1000.0)),
    );

    if let Some(forecast) = state.forecasts.get(key) {
        println!("\nNext 24 hours:");
        for (temp, wind) in temperature_series(forecast, unit)
            .iter()
            .zip(wind_series(forecast))
        {
            println!(
                "  {}  {:>5.1}  feels {:>5.1}  wind {:.1} m/s {}",
                temp.time, temp.temperature, temp.feels_like, wind.speed, wind.direction_label
            );
        }

        println!("\nPrecipitation:");
        for day in daily_precipitation(forecast) {
            println!(
                "  {:<12} {:>3.0}%  {}",
                day.label,
                day.probability * 100.0,
                precipitation_description(day.probability)
            );
        }
    }

    if let Some(error) = state.error {
        eprintln!("\n(showing last known data: {})", error);
    }
    Ok(())
}

fn summary_line(weather: &WeatherData, unit: TemperatureUnit) -> String {
    let condition = weather
        .primary_condition()
        .map_or("", |c| c.description.as_str());
    format!(
        "{:<24} {:>6} (feels {})  {:<18} wind {:.1} m/s {} ({})  at {}",
        format!("{}-{}", weather.name, weather.sys.country),
        format_temperature(weather.main.temp, unit),
        format_temperature(weather.main.feels_like, unit),
        condition,
        weather.wind.speed,
        wind_direction(weather.wind.deg),
        wind_description(weather.wind.speed),
        format_time(weather.dt),
    )
}

fn last_updated(state: &WeatherState) -> String {
    if state.last_updated == 0 {
        return "never".to_string();
    }
    format!("{} UTC", format_time(state.last_updated / 1000))
}
