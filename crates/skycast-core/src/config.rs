use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides `weather.api_key`.
pub const API_KEY_ENV: &str = "SKYCAST_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Offline cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Search box behavior
    #[serde(default)]
    pub search: SearchConfig,

    /// Device location settings
    #[serde(default)]
    pub location: LocationConfig,

    /// Release check settings
    #[serde(default)]
    pub update: UpdateConfig,

    /// UI preferences
    #[serde(default)]
    pub ui: UiConfig,
}

const MPH_TO_MS: f64 = 0.44704;

/// Unit system requested from the weather provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    /// Value of the provider's `units` query parameter
    pub fn as_query(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    /// Convert a provider wind speed in this unit system to metres per second
    pub fn wind_speed_to_ms(self, speed: f64) -> f64 {
        match self {
            Units::Imperial => speed * MPH_TO_MS,
            Units::Metric | Units::Standard => speed,
        }
    }

    /// Suffix used when printing temperatures
    pub fn temperature_suffix(self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
            Units::Standard => "K",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Provider credential (can also be set via `SKYCAST_API_KEY`)
    pub api_key: Option<String>,

    /// Provider base URL; `/weather` and `/forecast` are appended
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Unit system
    #[serde(default)]
    pub units: Units,

    /// Response language for condition descriptions
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            units: Units::default(),
            lang: default_lang(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Age after which the cached snapshot is not used to pre-populate on start
    #[serde(default = "default_cache_ttl_minutes")]
    pub ttl_minutes: u32,

    /// SQLite file holding settings, history and the cached snapshot
    #[serde(default = "default_database_path_str")]
    pub database_path: String,
}

fn default_cache_ttl_minutes() -> u32 {
    30
}

fn default_database_path_str() -> String {
    default_config_dir()
        .join("skycast.db")
        .to_string_lossy()
        .into_owned()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_cache_ttl_minutes(),
            database_path: default_database_path_str(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of remembered searches
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Quiet period before a typed query is fetched
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_history_limit() -> usize {
    10
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Fixed position reported as the device location
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Position request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Latest-release metadata endpoint
    #[serde(default = "default_release_url")]
    pub release_url: String,

    /// Whether `check-update` runs automatically on start
    #[serde(default = "default_check_on_start")]
    pub check_on_start: bool,
}

fn default_release_url() -> String {
    "https://api.github.com/repos/skycast-app/skycast/releases/latest".to_string()
}

fn default_check_on_start() -> bool {
    true
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            release_url: default_release_url(),
            check_on_start: default_check_on_start(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    /// Dark mode used until the user toggles it
    #[serde(default)]
    pub dark_mode: bool,
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skycast")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            weather: WeatherConfig {
                api_key: std::env::var(API_KEY_ENV).ok(), // Read from environment
                ..WeatherConfig::default()
            },
            cache: CacheConfig::default(),
            search: SearchConfig::default(),
            location: LocationConfig::default(),
            update: UpdateConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, creating default if it doesn't exist
    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let mut config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.weather.api_key = Some(key);
            }
        }

        Ok(config)
    }

    /// Load the default configuration file, creating it if it doesn't exist,
    /// and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config_path = Self::config_path()?;
        Self::load_validated_from(&config_path)
    }

    /// Load and validate configuration from an explicit path
    pub fn load_validated_from(config_path: &std::path::Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load_from(config_path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        if !validation.warnings.is_empty() {
            for warning in &validation.warnings {
                tracing::warn!("Config warning: {}", warning);
            }
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);
        self.validate_url(&self.update.release_url, "update.release_url", &mut result);

        match self.weather.api_key.as_deref() {
            None => result.add_warning(
                "weather.api_key",
                format!("No API key configured; set {} or weather.api_key", API_KEY_ENV),
            ),
            Some(key) if key.trim().is_empty() => {
                result.add_error("weather.api_key", "API key cannot be empty if provided")
            }
            Some(_) => {}
        }

        if self.weather.timeout_secs == 0 {
            result.add_error("weather.timeout_secs", "Timeout must be greater than 0");
        } else if self.weather.timeout_secs > 120 {
            result.add_warning("weather.timeout_secs", "Timeout is unusually long (>120s)");
        }

        if self.weather.lang.trim().is_empty() {
            result.add_error("weather.lang", "Language code cannot be empty");
        }

        if self.cache.ttl_minutes == 0 {
            result.add_warning(
                "cache.ttl_minutes",
                "Cached weather will never be shown on start (0 minutes)",
            );
        } else if self.cache.ttl_minutes > 1440 {
            result.add_warning(
                "cache.ttl_minutes",
                "Cache freshness window is more than 24 hours",
            );
        }

        if self.search.history_limit == 0 {
            result.add_error("search.history_limit", "History limit must be at least 1");
        } else if self.search.history_limit > 100 {
            result.add_warning("search.history_limit", "History limit is unusually large (>100)");
        }

        if self.search.debounce_ms > 5000 {
            result.add_warning("search.debounce_ms", "Search debounce is more than 5 seconds");
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    result.add_error("location.latitude", "Latitude must be between -90 and 90");
                }
                if !(-180.0..=180.0).contains(&lon) {
                    result.add_error(
                        "location.longitude",
                        "Longitude must be between -180 and 180",
                    );
                }
            }
            (None, None) => {}
            _ => result.add_error(
                "location",
                "Latitude and longitude must be configured together",
            ),
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Path of the SQLite store used for settings, history and the weather cache
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.cache.database_path)
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skycast");

        Ok(config_dir.join("config.toml"))
    }
}
