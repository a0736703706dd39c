pub mod config;
pub mod error;
pub mod fetch_state;

pub use config::{
    CacheConfig, Config, LocationConfig, SearchConfig, Units, UpdateConfig, ValidationResult,
    WeatherConfig,
};
pub use error::{
    ConfigError, LocationError, NetworkError, ReqwestErrorExt, RusqliteErrorExt,
    StorageError, UpdateError, WeatherError,
};
pub use fetch_state::FetchStatus;

use anyhow::Result;

/// Initialize logging for the application
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::info!("Skycast core initialized");
    Ok(())
}
