//! Centralized error types for the Skycast application.
//!
//! This module provides a typed error hierarchy that:
//! - Classifies provider and transport failures into the categories shown to the user
//! - Provides user-friendly messages suitable for notifications
//! - Preserves full error context for logging

use thiserror::Error;

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// Connectivity check failed before any request was issued.
    #[error("No internet connection")]
    Offline,

    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::Offline => "No internet connection. Check your connection and try again.",
            NetworkError::Timeout => "The response took too long. Please try again.",
            NetworkError::ConnectionFailed(_) => {
                "Network error. Check your connection and try again."
            }
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The weather service is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "Please try again later.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Weather provider errors, as surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    /// HTTP 404: the place name could not be resolved.
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// HTTP 401: the provider rejected the credential.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// HTTP 429.
    #[error("Rate limited by weather provider")]
    RateLimited,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Location(#[from] LocationError),
}

impl WeatherError {
    /// Classify a non-success HTTP status returned by the provider.
    pub fn from_status(status: u16, place: &str, message: impl Into<String>) -> Self {
        match status {
            404 => WeatherError::LocationNotFound(place.to_string()),
            401 => WeatherError::InvalidApiKey,
            429 => WeatherError::RateLimited,
            _ => WeatherError::Network(NetworkError::ServerError {
                status,
                message: message.into(),
            }),
        }
    }

    /// True when the failure came from the connectivity pre-check.
    pub fn is_offline(&self) -> bool {
        matches!(self, WeatherError::Network(NetworkError::Offline))
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::LocationNotFound(_) => "City not found. Check the name and try again.",
            WeatherError::InvalidApiKey => "Weather API key is invalid. Check settings.",
            WeatherError::RateLimited => "Too many requests. Please wait and try again.",
            WeatherError::InvalidQuery(_) => "Enter a city name or a valid location.",
            WeatherError::Network(e) => e.user_message(),
            WeatherError::Location(e) => e.user_message(),
        }
    }
}

/// Device location errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location service unavailable")]
    ServiceUnavailable,

    #[error("Location request cancelled")]
    Cancelled,

    #[error("Location request timed out")]
    Timeout,

    #[error("Location error: {0}")]
    Other(String),
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => {
                "Location permission is required. Allow access to use this feature."
            }
            LocationError::ServiceUnavailable => "Location services are unavailable.",
            LocationError::Cancelled => "The location request was cancelled.",
            LocationError::Timeout | LocationError::Other(_) => {
                "Could not determine your current location."
            }
        }
    }
}

/// Local storage errors (SQLite key-value store, JSON payloads).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Storage connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::ConnectionFailed(_) => {
                "Unable to access local data. Try restarting the app."
            }
            StorageError::QueryFailed(_) => "Saving local data failed.",
            StorageError::Corruption(_) | StorageError::Serialization(_) => {
                "Saved data could not be read and will be replaced."
            }
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// Release/version check errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Release has no tag")]
    MissingTag,

    #[error("Invalid version string: {0}")]
    InvalidVersion(String),
}

impl UpdateError {
    pub fn user_message(&self) -> &'static str {
        match self {
            UpdateError::Network(e) => e.user_message(),
            UpdateError::MissingTag | UpdateError::InvalidVersion(_) => {
                "Could not check for updates."
            }
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_storage_error(self) -> StorageError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_storage_error(self) -> StorageError {
        match &self {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                StorageError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen =>
            {
                StorageError::ConnectionFailed(self.to_string())
            }
            _ => StorageError::QueryFailed(self.to_string()),
        }
    }
}
