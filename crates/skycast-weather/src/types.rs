//! Domain types for queries, provider readings and aggregated summaries.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use skycast_core::WeatherError;

/// Geographic position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// What the user asked for: exactly one of a place name or a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WeatherQuery {
    City(String),
    Coordinates(Coordinates),
}

impl WeatherQuery {
    pub fn city(name: impl Into<String>) -> Self {
        Self::City(name.into())
    }

    pub fn coordinates(latitude: f64, longitude: f64) -> Self {
        Self::Coordinates(Coordinates::new(latitude, longitude))
    }

    /// Reject blank city names and out-of-range positions.
    pub fn validate(&self) -> Result<(), WeatherError> {
        match self {
            Self::City(name) if name.trim().is_empty() => {
                Err(WeatherError::InvalidQuery("city name is empty".into()))
            }
            Self::Coordinates(c) if !c.is_valid() => Err(WeatherError::InvalidQuery(format!(
                "coordinates out of range: {},{}",
                c.latitude, c.longitude
            ))),
            _ => Ok(()),
        }
    }

    /// Trimmed city name, if this is a non-blank city query.
    pub fn city_name(&self) -> Option<&str> {
        match self {
            Self::City(name) => Some(name.trim()).filter(|n| !n.is_empty()),
            Self::Coordinates(_) => None,
        }
    }

    /// Key recorded with the cached snapshot: the city name or `"lat,lon"`.
    pub fn cache_key(&self) -> String {
        match self {
            Self::City(name) => name.trim().to_string(),
            Self::Coordinates(c) => format!("{},{}", c.latitude, c.longitude),
        }
    }

    /// Inverse of [`cache_key`](Self::cache_key). Anything that is not two
    /// numbers separated by a comma is a city name.
    pub fn from_cache_key(key: &str) -> Self {
        let coords = key.split_once(',').and_then(|(lat, lon)| {
            Some(Coordinates::new(
                lat.trim().parse().ok()?,
                lon.trim().parse().ok()?,
            ))
        });
        match coords {
            Some(c) => Self::Coordinates(c),
            None => Self::City(key.to_string()),
        }
    }
}

impl std::fmt::Display for WeatherQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::City(name) => write!(f, "{}", name.trim()),
            Self::Coordinates(c) => write!(f, "{:.4}, {:.4}", c.latitude, c.longitude),
        }
    }
}

/// Provider condition groups (the `main` field of a condition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionGroup {
    Thunderstorm,
    Tornado,
    Rain,
    Snow,
    Drizzle,
    Squall,
    Clouds,
    Mist,
    Smoke,
    Haze,
    Dust,
    Fog,
    Sand,
    Ash,
    Clear,
    Unknown,
}

impl ConditionGroup {
    pub fn from_main(main: &str) -> Self {
        match main {
            "Thunderstorm" => Self::Thunderstorm,
            "Tornado" => Self::Tornado,
            "Rain" => Self::Rain,
            "Snow" => Self::Snow,
            "Drizzle" => Self::Drizzle,
            "Squall" => Self::Squall,
            "Clouds" => Self::Clouds,
            "Mist" => Self::Mist,
            "Smoke" => Self::Smoke,
            "Haze" => Self::Haze,
            "Dust" => Self::Dust,
            "Fog" => Self::Fog,
            "Sand" => Self::Sand,
            "Ash" => Self::Ash,
            "Clear" => Self::Clear,
            _ => Self::Unknown,
        }
    }

    /// Rank used to pick a day's dominant condition. Higher wins.
    pub fn severity(self) -> u8 {
        match self {
            Self::Thunderstorm | Self::Tornado => 5,
            Self::Rain | Self::Snow => 4,
            Self::Drizzle | Self::Squall => 3,
            Self::Clouds
            | Self::Mist
            | Self::Smoke
            | Self::Haze
            | Self::Dust
            | Self::Fog
            | Self::Sand
            | Self::Ash => 2,
            Self::Clear => 1,
            Self::Unknown => 0,
        }
    }

    /// Background scene for this group.
    pub fn scene(self) -> Scene {
        match self {
            Self::Thunderstorm | Self::Rain | Self::Drizzle => Scene::Rain,
            Self::Clouds
            | Self::Mist
            | Self::Smoke
            | Self::Haze
            | Self::Dust
            | Self::Fog
            | Self::Sand
            | Self::Ash => Scene::Cloudy,
            Self::Snow => Scene::Snow,
            Self::Squall | Self::Tornado => Scene::Windy,
            Self::Clear | Self::Unknown => Scene::Clear,
        }
    }
}

/// A provider condition reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub code: u32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

impl Condition {
    pub fn group(&self) -> ConditionGroup {
        ConditionGroup::from_main(&self.main)
    }

    pub fn severity(&self) -> u8 {
        self.group().severity()
    }
}

/// Background scene category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scene {
    Clear,
    Rain,
    Cloudy,
    Snow,
    Windy,
}

/// Background choice for the main weather screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backdrop {
    pub night: bool,
    pub scene: Scene,
}

impl Backdrop {
    /// Asset key, e.g. `night-rain`
    pub fn key(&self) -> String {
        let prefix = if self.night { "night" } else { "day" };
        let scene = match self.scene {
            Scene::Clear => "clear",
            Scene::Rain => "rain",
            Scene::Cloudy => "cloudy",
            Scene::Snow => "snow",
            Scene::Windy => "windy",
        };
        format!("{}-{}", prefix, scene)
    }
}

/// Current conditions at one place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub country: Option<String>,
    pub coordinates: Coordinates,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
    pub pressure: f64,
    /// Meters
    pub visibility: Option<u32>,
    /// Meters per second
    pub wind_speed: f64,
    /// Degrees
    pub wind_direction: Option<u16>,
    pub condition: Condition,
    /// Epoch seconds
    pub sunrise: Option<i64>,
    /// Epoch seconds
    pub sunset: Option<i64>,
    /// Epoch seconds
    pub observed_at: i64,
    /// Seconds east of UTC at this place
    pub timezone_offset: i32,
}

impl WeatherSnapshot {
    /// Night when before sunrise or after sunset. Unknown times count as day.
    pub fn is_night(&self, now: DateTime<Utc>) -> bool {
        let now = now.timestamp();
        match (self.sunrise, self.sunset) {
            (Some(sunrise), Some(sunset)) => now < sunrise || now > sunset,
            _ => false,
        }
    }

    pub fn backdrop(&self, now: DateTime<Utc>) -> Backdrop {
        Backdrop {
            night: self.is_night(now),
            scene: self.condition.group().scene(),
        }
    }

    pub fn utc_offset(&self) -> FixedOffset {
        offset_from_secs(self.timezone_offset)
    }
}

/// One raw time-stamped forecast reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: f64,
    pub humidity: u8,
    pub condition: Condition,
    /// Meters per second
    pub wind_speed: f64,
    /// Probability of precipitation, 0..=1
    pub precipitation_probability: f64,
}

/// Near-term forecast row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySummary {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    /// `HH:MM` local time, or the "now" marker
    pub label: String,
    pub hour: u32,
    pub temperature: i64,
    pub feels_like: i64,
    pub humidity: u8,
    pub wind_kmh: i64,
    pub pressure: f64,
    pub precipitation_chance: u8,
    pub icon: String,
    pub description: String,
    pub is_current_hour: bool,
}

/// One reading inside a day's breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayHour {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    pub label: String,
    pub hour: u32,
    pub temperature: i64,
    pub feels_like: i64,
    pub humidity: u8,
    pub wind_kmh: i64,
    pub pressure: f64,
    pub precipitation_chance: u8,
    pub icon: String,
    pub description: String,
}

/// Per-day forecast summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    /// `YYYY-MM-DD` in provider-local time
    pub date_key: String,
    pub date: NaiveDate,
    pub temp_max: i64,
    pub temp_min: i64,
    pub dominant_condition: Condition,
    pub hourly: Vec<DayHour>,
}

impl DailySummary {
    /// Middle reading of the day, or the high when the day has none.
    pub fn representative_temperature(&self) -> i64 {
        self.hourly
            .get(self.hourly.len() / 2)
            .map(|h| h.temperature)
            .unwrap_or(self.temp_max)
    }

    pub fn is_today(&self, today: NaiveDate) -> bool {
        self.date == today
    }
}

/// Raw result of one successful provider round trip
#[derive(Debug, Clone)]
pub struct WeatherBundle {
    pub snapshot: WeatherSnapshot,
    pub forecast: Vec<ForecastEntry>,
    /// Seconds east of UTC used to group the forecast by day
    pub utc_offset_secs: i32,
}

impl WeatherBundle {
    pub fn utc_offset(&self) -> FixedOffset {
        offset_from_secs(self.utc_offset_secs)
    }
}

/// Everything the weather screens render; cached as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    pub snapshot: WeatherSnapshot,
    pub daily: Vec<DailySummary>,
    pub hourly: Vec<HourlySummary>,
}

pub(crate) fn offset_from_secs(secs: i32) -> FixedOffset {
    FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix())
}
