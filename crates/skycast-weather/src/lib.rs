//! Weather data for Skycast
//!
//! Fetches current conditions and forecasts from an OpenWeatherMap-compatible
//! API, shapes them into hourly and daily summaries, and persists the last
//! result, search history and settings in a local SQLite store.

pub mod aggregate;
pub mod cache;
pub mod history;
pub mod location;
pub mod network;
pub mod provider;
pub mod store;
pub mod types;

pub use aggregate::{build_daily, build_hourly, NOW_LABEL};
pub use cache::{CacheRecord, WeatherCache};
pub use history::SearchHistory;
pub use location::{locate, FixedLocation, LocationProvider, PermissionStatus};
pub use network::{ConnectivityProbe, HttpProbe, NetworkState, StaticProbe};
pub use provider::WeatherProvider;
pub use store::{KeyValueStore, SqliteStore, StoreKey};
pub use types::*;
