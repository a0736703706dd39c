//! Persisted user settings.

use serde::{Deserialize, Serialize};
use skycast_core::StorageError;
use skycast_weather::store::{load_json, save_json};
use skycast_weather::{KeyValueStore, StoreKey};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub dark_mode: bool,
}

impl AppSettings {
    /// Load saved settings, or `defaults` if none were saved.
    pub fn load(store: &dyn KeyValueStore, defaults: AppSettings) -> Result<Self, StorageError> {
        Ok(load_json(store, StoreKey::Settings)?.unwrap_or(defaults))
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        save_json(store, StoreKey::Settings, self)
    }

    /// Flip dark mode and persist the result.
    pub fn toggle_dark_mode(&mut self, store: &dyn KeyValueStore) -> Result<bool, StorageError> {
        self.dark_mode = !self.dark_mode;
        self.save(store)?;
        tracing::info!("Dark mode {}", if self.dark_mode { "on" } else { "off" });
        Ok(self.dark_mode)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use skycast_weather::SqliteStore;

    #[test]
    fn test_defaults_when_unsaved() {
        let store = SqliteStore::in_memory().unwrap();
        let settings = AppSettings::load(&store, AppSettings { dark_mode: true }).unwrap();
        assert!(settings.dark_mode);
    }

    #[test]
    fn test_toggle_persists() {
        let store = SqliteStore::in_memory().unwrap();
        let mut settings = AppSettings::default();
        assert!(settings.toggle_dark_mode(&store).unwrap());

        let loaded = AppSettings::load(&store, AppSettings::default()).unwrap();
        assert!(loaded.dark_mode);
        assert_eq!(
            store.get(StoreKey::Settings).unwrap().as_deref(),
            Some(r#"{"darkMode":true}"#)
        );
    }
}
