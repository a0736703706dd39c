//! Single-slot cache of the last successful weather fetch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skycast_core::StorageError;

use crate::store::{load_json, save_json, KeyValueStore, StoreKey};
use crate::types::WeatherPayload;

/// Freshness window for pre-populating state on start
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// The stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub payload: WeatherPayload,
    /// Epoch milliseconds
    pub written_at: i64,
    /// City name or `"lat,lon"`
    pub key: String,
}

impl CacheRecord {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        let ms = now.timestamp_millis().saturating_sub(self.written_at).max(0);
        Duration::from_millis(ms as u64)
    }
}

pub struct WeatherCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl WeatherCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Overwrite the slot with a fresh record.
    pub fn save(
        &self,
        payload: &WeatherPayload,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let record = CacheRecord {
            payload: payload.clone(),
            written_at: now.timestamp_millis(),
            key: key.to_string(),
        };
        save_json(self.store.as_ref(), StoreKey::WeatherCache, &record)?;
        tracing::debug!("Cached weather for {}", key);
        Ok(())
    }

    /// Record younger than the TTL, for start-up pre-population.
    pub fn load_fresh(&self, now: DateTime<Utc>) -> Result<Option<CacheRecord>, StorageError> {
        Ok(self.load_any()?.filter(|record| {
            let fresh = record.age(now) < self.ttl;
            if !fresh {
                tracing::debug!("Cached weather for {} has expired", record.key);
            }
            fresh
        }))
    }

    /// Record of any age, for the failure fallback.
    pub fn load_any(&self) -> Result<Option<CacheRecord>, StorageError> {
        load_json(self.store.as_ref(), StoreKey::WeatherCache)
    }
}
