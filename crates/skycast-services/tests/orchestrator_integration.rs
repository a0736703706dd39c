//! Integration tests for WeatherOrchestrator against a mock weather API.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use skycast_core::{Config, FetchStatus, StorageError, WeatherConfig, WeatherError};
use skycast_services::{FetchOutcome, Screen, WeatherOrchestrator};
use skycast_weather::{
    FixedLocation, KeyValueStore, NetworkState, SearchHistory, SqliteStore, StaticProbe,
    StoreKey, WeatherCache, WeatherProvider, WeatherQuery,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

fn current_json(name: &str) -> serde_json::Value {
    let now = now_secs();
    json!({
        "coord": {"lon": 31.25, "lat": 30.06},
        "weather": [{"id": 801, "main": "Clouds", "description": "few clouds", "icon": "02d"}],
        "main": {"temp": 24.6, "feels_like": 24.2, "temp_min": 23.0, "temp_max": 26.0,
                 "pressure": 1014, "humidity": 41},
        "visibility": 10000,
        "wind": {"speed": 3.6, "deg": 20},
        "dt": now,
        "sys": {"country": "EG", "sunrise": now - 20_000, "sunset": now + 20_000},
        "timezone": 10800,
        "name": name
    })
}

fn forecast_json() -> serde_json::Value {
    // First slot starts at the top of the next hour
    let start = (now_secs() / 3600 + 1) * 3600;
    let list: Vec<_> = (0..40)
        .map(|i| {
            json!({
                "dt": start + i * 3 * 3600,
                "main": {"temp": 22.0, "feels_like": 21.0, "temp_min": 20.0, "temp_max": 25.0,
                         "pressure": 1013, "humidity": 50},
                "weather": [{"id": 802, "main": "Clouds", "description": "scattered clouds", "icon": "03d"}],
                "wind": {"speed": 2.5, "deg": 90},
                "pop": 0.1
            })
        })
        .collect();
    json!({"cod": "200", "list": list, "city": {"name": "x", "timezone": 10800}})
}

async fn mount_city(server: &MockServer, name: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", name))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_json(name))
                .set_delay(delay),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("q", name))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(forecast_json())
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

async fn mount_coordinates(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "30.06"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json("Cairo")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("lat", "30.06"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json()))
        .mount(server)
        .await;
}

fn config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.weather = WeatherConfig {
        api_key: Some("test-key".into()),
        base_url: format!("{}/data/2.5", server.uri()),
        ..WeatherConfig::default()
    };
    config.search.debounce_ms = 50;
    config
}

fn orchestrator(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    network: NetworkState,
) -> Arc<WeatherOrchestrator> {
    let provider = WeatherProvider::new(&config.weather).unwrap();
    Arc::new(WeatherOrchestrator::new(
        config,
        provider,
        store,
        Arc::new(StaticProbe(network)),
    ))
}

fn memory_store() -> Arc<dyn KeyValueStore> {
    Arc::new(SqliteStore::in_memory().unwrap())
}

fn cached_key(store: &Arc<dyn KeyValueStore>) -> Option<String> {
    WeatherCache::new(store.clone(), Duration::from_secs(1800))
        .load_any()
        .unwrap()
        .map(|r| r.key)
}

#[tokio::test]
async fn test_successful_fetch_updates_state_cache_and_history() {
    let server = MockServer::start().await;
    mount_city(&server, "Cairo", Duration::ZERO).await;
    let store = memory_store();
    let orch = orchestrator(&config(&server), store.clone(), NetworkState::ONLINE);

    let outcome = orch.fetch(WeatherQuery::city(" Cairo ")).await;
    assert_eq!(outcome, FetchOutcome::Loaded);

    let state = orch.state();
    assert_eq!(state.status, FetchStatus::Loaded);
    assert_eq!(state.screen(), Screen::Weather);
    assert!(state.error.is_none());
    assert!(!state.showing_cached);
    assert_eq!(state.snapshot.as_ref().unwrap().location_name, "Cairo");
    assert!(!state.hourly.is_empty() && state.hourly.len() <= 8);
    assert!(!state.daily.is_empty() && state.daily.len() <= 5);
    assert_eq!(state.history.entries(), ["Cairo"]);
    assert!(state.day_detail(0).is_some_and(|d| !d.hourly.is_empty()));

    assert_eq!(cached_key(&store).as_deref(), Some("Cairo"));
}

#[tokio::test]
async fn test_coordinate_fetch_uses_lat_lon_key_and_skips_history() {
    let server = MockServer::start().await;
    mount_coordinates(&server).await;
    let store = memory_store();
    let orch = orchestrator(&config(&server), store.clone(), NetworkState::ONLINE);

    let outcome = orch.fetch(WeatherQuery::coordinates(30.06, 31.25)).await;
    assert_eq!(outcome, FetchOutcome::Loaded);
    assert!(orch.state().history.is_empty());
    assert_eq!(cached_key(&store).as_deref(), Some("30.06,31.25"));
}

#[tokio::test]
async fn test_failure_falls_back_to_cached_result() {
    let server = MockServer::start().await;
    mount_city(&server, "Cairo", Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(query_param("q", "Atlantis"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"cod": "404", "message": "city not found"})),
        )
        .mount(&server)
        .await;

    let store = memory_store();
    let orch = orchestrator(&config(&server), store.clone(), NetworkState::ONLINE);
    assert_eq!(orch.fetch(WeatherQuery::city("Cairo")).await, FetchOutcome::Loaded);

    let outcome = orch.fetch(WeatherQuery::city("Atlantis")).await;
    assert_eq!(
        outcome,
        FetchOutcome::ServedFromCache(WeatherError::LocationNotFound("Atlantis".into()))
    );

    let state = orch.state();
    assert_eq!(state.status, FetchStatus::Stale);
    assert_eq!(state.screen(), Screen::Weather);
    assert!(state.showing_cached);
    assert_eq!(state.snapshot.as_ref().unwrap().location_name, "Cairo");
    assert_eq!(state.history.entries(), ["Cairo"]);
    assert_eq!(cached_key(&store).as_deref(), Some("Cairo"));
}

#[tokio::test]
async fn test_failure_without_cache_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"cod": 429})))
        .mount(&server)
        .await;

    let orch = orchestrator(&config(&server), memory_store(), NetworkState::ONLINE);
    let outcome = orch.fetch(WeatherQuery::city("Cairo")).await;
    assert_eq!(outcome, FetchOutcome::Failed(WeatherError::RateLimited));

    let state = orch.state();
    assert_eq!(state.status, FetchStatus::Failed);
    assert_eq!(state.screen(), Screen::Error);
    assert!(state.history.is_empty());
}

#[tokio::test]
async fn test_offline_serves_cache_of_any_age() {
    let server = MockServer::start().await;
    mount_city(&server, "Cairo", Duration::ZERO).await;
    let store = memory_store();
    let cfg = config(&server);

    let online = orchestrator(&cfg, store.clone(), NetworkState::ONLINE);
    assert_eq!(online.fetch(WeatherQuery::city("Cairo")).await, FetchOutcome::Loaded);

    let offline = orchestrator(&cfg, store.clone(), NetworkState::OFFLINE);
    let outcome = offline.fetch(WeatherQuery::city("Giza")).await;
    assert!(matches!(outcome, FetchOutcome::ServedFromCache(ref e) if e.is_offline()));

    let state = offline.state();
    assert!(state.is_offline);
    assert_eq!(state.screen(), Screen::Weather);
}

#[tokio::test]
async fn test_newer_request_wins() {
    let server = MockServer::start().await;
    mount_city(&server, "Slowville", Duration::from_millis(600)).await;
    mount_city(&server, "Fastville", Duration::ZERO).await;
    let store = memory_store();
    let orch = orchestrator(&config(&server), store.clone(), NetworkState::ONLINE);

    let slow = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.fetch(WeatherQuery::city("Slowville")).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let fast = orch.fetch(WeatherQuery::city("Fastville")).await;
    assert_eq!(fast, FetchOutcome::Loaded);
    assert_eq!(slow.await.unwrap(), FetchOutcome::Superseded);

    let state = orch.state();
    assert_eq!(state.snapshot.as_ref().unwrap().location_name, "Fastville");
    assert_eq!(state.history.entries(), ["Fastville"]);
    assert_eq!(cached_key(&store).as_deref(), Some("Fastville"));
}

#[tokio::test]
async fn test_restore_from_fresh_cache() {
    let server = MockServer::start().await;
    mount_city(&server, "Cairo", Duration::ZERO).await;
    let store = memory_store();
    let cfg = config(&server);

    let first = orchestrator(&cfg, store.clone(), NetworkState::ONLINE);
    first.fetch(WeatherQuery::city("Cairo")).await;

    let second = orchestrator(&cfg, store.clone(), NetworkState::ONLINE);
    assert!(second.restore().unwrap());

    let state = second.state();
    assert_eq!(state.status, FetchStatus::Loaded);
    assert!(state.showing_cached);
    assert_eq!(state.snapshot.as_ref().unwrap().location_name, "Cairo");
    assert_eq!(state.history.entries(), ["Cairo"]);
    assert_eq!(state.last_query, Some(WeatherQuery::city("Cairo")));
}

/// SQLite store whose history reads can be made to fail
struct UnreadableHistoryStore {
    inner: SqliteStore,
    failing: AtomicBool,
}

impl KeyValueStore for UnreadableHistoryStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StorageError> {
        if key == StoreKey::SearchHistory && self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::QueryFailed("disk I/O error".into()));
        }
        self.inner.get(key)
    }

    fn set(&self, key: StoreKey, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: StoreKey) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

#[tokio::test]
async fn test_unreadable_history_is_not_overwritten() {
    let server = MockServer::start().await;
    mount_city(&server, "Cairo", Duration::ZERO).await;
    mount_city(&server, "Giza", Duration::ZERO).await;

    let store = Arc::new(UnreadableHistoryStore {
        inner: SqliteStore::in_memory().unwrap(),
        failing: AtomicBool::new(true),
    });
    let mut saved = SearchHistory::default();
    saved.push("London");
    saved.push("Paris");
    saved.save(&store.inner).unwrap();

    let orch = orchestrator(&config(&server), store.clone(), NetworkState::ONLINE);
    assert!(orch.restore().is_err());

    assert_eq!(orch.fetch(WeatherQuery::city("Cairo")).await, FetchOutcome::Loaded);
    assert_eq!(orch.state().history.entries(), ["Cairo"]);
    let persisted = SearchHistory::load(&store.inner, 10).unwrap();
    assert_eq!(persisted.entries(), ["Paris", "London"]);

    // Once readable again the stored list is merged, not replaced
    store.failing.store(false, Ordering::SeqCst);
    assert_eq!(orch.fetch(WeatherQuery::city("Giza")).await, FetchOutcome::Loaded);
    let persisted = SearchHistory::load(&store.inner, 10).unwrap();
    assert_eq!(persisted.entries(), ["Giza", "Paris", "London"]);
    assert_eq!(orch.state().history.entries(), ["Giza", "Paris", "London"]);
}

#[tokio::test]
async fn test_debounced_search_fetches_last_input_only() {
    let server = MockServer::start().await;
    mount_city(&server, "Cairo", Duration::ZERO).await;
    let orch = orchestrator(&config(&server), memory_store(), NetworkState::ONLINE);

    let handles: Vec<_> = ["Ca", "Cai", "Cairo "]
        .iter()
        .filter_map(|text| orch.search(text))
        .collect();
    assert!(orch.search("   ").is_none());

    let mut fired = Vec::new();
    for handle in handles {
        fired.push(handle.await.unwrap());
    }
    // The blank input cancelled the last pending search as well
    assert_eq!(fired, vec![false, false, false]);

    let handle = orch.search("Cairo").unwrap();
    assert!(handle.await.unwrap());
    assert_eq!(orch.state().history.entries(), ["Cairo"]);
}

#[tokio::test]
async fn test_refresh_uses_on_screen_coordinates() {
    let server = MockServer::start().await;
    mount_city(&server, "Cairo", Duration::ZERO).await;
    mount_coordinates(&server).await;
    let store = memory_store();
    let orch = orchestrator(&config(&server), store.clone(), NetworkState::ONLINE);

    orch.fetch(WeatherQuery::city("Cairo")).await;
    let outcome = orch.refresh(&FixedLocation::new(None)).await;

    assert_eq!(outcome, FetchOutcome::Loaded);
    assert_eq!(cached_key(&store).as_deref(), Some("30.06,31.25"));
}

#[tokio::test]
async fn test_refresh_without_anything_uses_device_location() {
    let server = MockServer::start().await;
    mount_coordinates(&server).await;
    let orch = orchestrator(&config(&server), memory_store(), NetworkState::ONLINE);

    let locator = FixedLocation::new(Some(skycast_weather::Coordinates::new(30.06, 31.25)));
    assert_eq!(orch.refresh(&locator).await, FetchOutcome::Loaded);
}
