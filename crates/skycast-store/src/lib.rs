//! Application state for SkyCast.
//!
//! `WeatherStore` owns the dashboard state and is the only way to change it.
//! Favorites and the unit preference are persisted through a
//! `KeyValueStorage` backend.

pub mod error;
pub mod state;
pub mod storage;
pub mod store;

pub use error::StoreError;
pub use state::WeatherState;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, FAVORITES_KEY, TEMPERATURE_UNIT_KEY};
pub use store::{FailedRefresh, RefreshReport, WeatherStore};
