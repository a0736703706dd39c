//! Weather fetch orchestration.
//!
//! Every fetch gets an increasing request id. Only the most recently issued
//! request may change state, write the cache or update search history; results
//! of older requests are dropped when they arrive.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use skycast_core::{Config, NetworkError, StorageError, WeatherError};
use skycast_weather::{
    build_daily, build_hourly, locate, ConnectivityProbe, KeyValueStore, LocationProvider,
    SearchHistory, WeatherBundle, WeatherCache, WeatherPayload, WeatherProvider, WeatherQuery,
};
use tokio::task::JoinHandle;

use crate::debounce::Debouncer;
use crate::settings::AppSettings;
use crate::state::AppState;

/// How a fetch ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fresh data is on screen
    Loaded,
    /// A newer request was issued while this one ran; nothing changed
    Superseded,
    /// Fetch failed; the last cached result is on screen
    ServedFromCache(WeatherError),
    /// Fetch failed and no cached result exists
    Failed(WeatherError),
}

impl FetchOutcome {
    pub fn error(&self) -> Option<&WeatherError> {
        match self {
            FetchOutcome::ServedFromCache(e) | FetchOutcome::Failed(e) => Some(e),
            FetchOutcome::Loaded | FetchOutcome::Superseded => None,
        }
    }
}

pub struct WeatherOrchestrator {
    provider: WeatherProvider,
    cache: WeatherCache,
    store: Arc<dyn KeyValueStore>,
    probe: Arc<dyn ConnectivityProbe>,
    state: Mutex<AppState>,
    latest_request: AtomicU64,
    /// Set once the persisted history has been read into state
    history_loaded: AtomicBool,
    history_limit: usize,
    location_timeout: Duration,
    default_settings: AppSettings,
    debouncer: Debouncer,
}

impl WeatherOrchestrator {
    pub fn new(
        config: &Config,
        provider: WeatherProvider,
        store: Arc<dyn KeyValueStore>,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        let cache = WeatherCache::new(
            store.clone(),
            Duration::from_secs(u64::from(config.cache.ttl_minutes) * 60),
        );
        let history_limit = config.search.history_limit;

        Self {
            provider,
            cache,
            store,
            probe,
            state: Mutex::new(AppState {
                history: SearchHistory::with_limit(history_limit),
                ..AppState::default()
            }),
            latest_request: AtomicU64::new(0),
            history_loaded: AtomicBool::new(false),
            history_limit,
            location_timeout: Duration::from_secs(config.location.timeout_secs),
            default_settings: AppSettings {
                dark_mode: config.ui.dark_mode,
            },
            debouncer: Debouncer::new(Duration::from_millis(config.search.debounce_ms)),
        }
    }

    /// Copy of the current state.
    pub fn state(&self) -> AppState {
        self.state.lock().clone()
    }

    /// Load settings, search history and a fresh cached result.
    ///
    /// Returns true if cached weather was restored.
    pub fn restore(&self) -> Result<bool, StorageError> {
        let settings = AppSettings::load(self.store.as_ref(), self.default_settings)?;
        let history = SearchHistory::load(self.store.as_ref(), self.history_limit)?;
        let record = self.cache.load_fresh(Utc::now())?;

        let mut state = self.state.lock();
        state.settings = settings;
        state.history = history;
        self.history_loaded.store(true, Ordering::SeqCst);

        let Some(record) = record else {
            tracing::debug!("No fresh cached weather to restore");
            return Ok(false);
        };

        tracing::info!("Restored cached weather for {}", record.key);
        state.last_query = Some(WeatherQuery::from_cache_key(&record.key));
        state.show(record.payload, written_at(record.written_at), true);
        state.status = state.status.on_restored();
        Ok(true)
    }

    /// Fetch weather for `query` and apply the result if it is still the
    /// latest request when it completes.
    pub async fn fetch(&self, query: WeatherQuery) -> FetchOutcome {
        let id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;

        if let Err(e) = query.validate() {
            return self.reject(id, e);
        }

        {
            let mut state = self.state.lock();
            state.status = state.status.on_start();
            state.error = None;
            state.last_query = Some(query.clone());
        }

        let network = self.probe.check().await;
        if !self.is_current(id) {
            return FetchOutcome::Superseded;
        }
        if !network.is_online() {
            tracing::warn!("Offline, not fetching weather for {}", query);
            self.state.lock().is_offline = true;
            return self.fail(id, WeatherError::Network(NetworkError::Offline));
        }
        self.state.lock().is_offline = false;

        match self.provider.fetch(&query).await {
            Ok(bundle) => self.apply(id, &query, bundle),
            Err(e) => self.fail(id, e),
        }
    }

    /// Fetch for the device position.
    pub async fn fetch_current_location(&self, locator: &dyn LocationProvider) -> FetchOutcome {
        let id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        match locate(locator, self.location_timeout).await {
            Ok(position) => self.fetch(WeatherQuery::Coordinates(position)).await,
            Err(e) => {
                tracing::warn!("Could not determine location: {}", e);
                self.reject(id, e.into())
            }
        }
    }

    /// Re-fetch what is on screen: its coordinates, else the last query,
    /// else the device position.
    pub async fn refresh(&self, locator: &dyn LocationProvider) -> FetchOutcome {
        let query = {
            let state = self.state.lock();
            state
                .snapshot
                .as_ref()
                .map(|s| WeatherQuery::Coordinates(s.coordinates))
                .or_else(|| state.last_query.clone())
        };

        match query {
            Some(query) => self.fetch(query).await,
            None => self.fetch_current_location(locator).await,
        }
    }

    /// Debounced city search. Blank input cancels any pending search.
    pub fn search(self: &Arc<Self>, text: &str) -> Option<JoinHandle<bool>> {
        let name = text.trim().to_string();
        if name.is_empty() {
            self.debouncer.cancel();
            return None;
        }

        let this = Arc::clone(self);
        Some(self.debouncer.schedule(async move {
            let outcome = this.fetch(WeatherQuery::City(name)).await;
            tracing::debug!("Debounced search finished: {:?}", outcome);
        }))
    }

    pub fn clear_history(&self) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        state.history.clear();
        state.history.save(self.store.as_ref())?;
        self.history_loaded.store(true, Ordering::SeqCst);
        tracing::info!("Search history cleared");
        Ok(())
    }

    pub fn toggle_dark_mode(&self) -> Result<bool, StorageError> {
        let mut state = self.state.lock();
        state.settings.toggle_dark_mode(self.store.as_ref())
    }

    fn is_current(&self, id: u64) -> bool {
        self.latest_request.load(Ordering::SeqCst) == id
    }

    fn apply(&self, id: u64, query: &WeatherQuery, bundle: WeatherBundle) -> FetchOutcome {
        let now = Utc::now();
        let offset = bundle.utc_offset();
        let payload = WeatherPayload {
            hourly: build_hourly(&bundle.forecast, now, offset),
            daily: build_daily(&bundle.forecast, offset),
            snapshot: bundle.snapshot,
        };

        let mut state = self.state.lock();
        if !self.is_current(id) {
            tracing::debug!("Discarding result of superseded request {}", id);
            return FetchOutcome::Superseded;
        }

        if let Err(e) = self.cache.save(&payload, &query.cache_key(), now) {
            tracing::warn!("Failed to cache weather: {}", e);
        }

        tracing::info!("Showing weather for {}", payload.snapshot.location_name);
        state.show(payload, now, false);
        state.status = state.status.on_success();
        state.error = None;

        if let Some(name) = query.city_name() {
            let loaded = self.load_history_once(&mut state);
            if state.history.push(name) {
                if !loaded {
                    tracing::warn!("Search history could not be read; not saving it");
                } else if let Err(e) = state.history.save(self.store.as_ref()) {
                    tracing::warn!("Failed to save search history: {}", e);
                }
            }
        }

        FetchOutcome::Loaded
    }

    /// Read the persisted history into state unless that already happened.
    /// Returns false while it cannot be read, so the stored list is never
    /// overwritten by a partial one.
    fn load_history_once(&self, state: &mut AppState) -> bool {
        if self.history_loaded.load(Ordering::SeqCst) {
            return true;
        }
        match SearchHistory::load(self.store.as_ref(), self.history_limit) {
            Ok(history) => {
                state.history = history;
                self.history_loaded.store(true, Ordering::SeqCst);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to load search history: {}", e);
                false
            }
        }
    }

    /// Record a failure and fall back to the cached result of any age.
    fn fail(&self, id: u64, error: WeatherError) -> FetchOutcome {
        let mut state = self.state.lock();
        if !self.is_current(id) {
            tracing::debug!("Ignoring failure of superseded request {}: {}", id, error);
            return FetchOutcome::Superseded;
        }

        tracing::warn!("Weather fetch failed: {}", error);
        state.error = Some(error.clone());

        let cached = match self.cache.load_any() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Failed to read cached weather: {}", e);
                None
            }
        };

        match cached {
            Some(record) => {
                tracing::info!("Showing cached weather for {}", record.key);
                state.show(record.payload, written_at(record.written_at), true);
                state.status = state.status.on_failure(true);
                FetchOutcome::ServedFromCache(error)
            }
            None => {
                state.status = state.status.on_failure(state.has_data());
                FetchOutcome::Failed(error)
            }
        }
    }

    /// Record a failure that happened before any request was sent.
    fn reject(&self, id: u64, error: WeatherError) -> FetchOutcome {
        let mut state = self.state.lock();
        if !self.is_current(id) {
            return FetchOutcome::Superseded;
        }
        state.error = Some(error.clone());
        state.status = state.status.on_failure(state.has_data());
        FetchOutcome::Failed(error)
    }
}

fn written_at(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}
