//! Device location.

use std::time::Duration;

use async_trait::async_trait;
use skycast_core::{LocationConfig, LocationError};

use crate::types::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// Source of the device position
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn permission_status(&self) -> PermissionStatus;

    /// Ask the user for permission; returns the resulting status.
    async fn request_permission(&self) -> PermissionStatus;

    async fn current_position(&self, timeout: Duration) -> Result<Coordinates, LocationError>;
}

/// Resolve the device position, asking for permission first if needed.
pub async fn locate(
    provider: &dyn LocationProvider,
    timeout: Duration,
) -> Result<Coordinates, LocationError> {
    let mut status = provider.permission_status().await;
    if status != PermissionStatus::Granted {
        tracing::debug!("Location permission is {:?}, requesting", status);
        status = provider.request_permission().await;
    }

    if status != PermissionStatus::Granted {
        tracing::warn!("Location permission denied");
        return Err(LocationError::PermissionDenied);
    }

    match tokio::time::timeout(timeout, provider.current_position(timeout)).await {
        Ok(result) => result,
        Err(_) => Err(LocationError::Timeout),
    }
}

/// Position taken from configuration
#[derive(Debug, Clone, Default)]
pub struct FixedLocation {
    position: Option<Coordinates>,
}

impl FixedLocation {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }

    pub fn from_config(config: &LocationConfig) -> Self {
        let position = match (config.latitude, config.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        };
        Self { position }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn permission_status(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn current_position(&self, _timeout: Duration) -> Result<Coordinates, LocationError> {
        self.position.ok_or(LocationError::ServiceUnavailable)
    }
}
