//! Application state shown by the screens.
//!
//! Mutated only by [`WeatherOrchestrator`](crate::WeatherOrchestrator).

use chrono::{DateTime, Utc};
use skycast_core::{FetchStatus, WeatherError};
use skycast_weather::{
    Backdrop, DailySummary, HourlySummary, SearchHistory, WeatherPayload, WeatherQuery,
    WeatherSnapshot,
};

use crate::settings::AppSettings;

/// Which top-level screen to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Nothing fetched yet
    Intro,
    Loading,
    Weather,
    /// No data and no connection
    Offline,
    /// No data and the last fetch failed
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub snapshot: Option<WeatherSnapshot>,
    pub daily: Vec<DailySummary>,
    pub hourly: Vec<HourlySummary>,
    pub status: FetchStatus,
    pub error: Option<WeatherError>,
    pub history: SearchHistory,
    pub settings: AppSettings,
    pub last_updated: Option<DateTime<Utc>>,
    /// Query behind the data on screen, or the last one issued
    pub last_query: Option<WeatherQuery>,
    pub is_offline: bool,
    /// Data on screen came from the cache rather than a fresh fetch
    pub showing_cached: bool,
}

impl AppState {
    pub fn has_data(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn screen(&self) -> Screen {
        if self.has_data() {
            Screen::Weather
        } else if self.status.is_loading() {
            Screen::Loading
        } else if self.is_offline {
            Screen::Offline
        } else if self.status == FetchStatus::Failed {
            Screen::Error
        } else {
            Screen::Intro
        }
    }

    /// Hourly breakdown for one entry of the daily list.
    pub fn day_detail(&self, index: usize) -> Option<&DailySummary> {
        self.daily.get(index)
    }

    pub fn backdrop(&self, now: DateTime<Utc>) -> Option<Backdrop> {
        self.snapshot.as_ref().map(|s| s.backdrop(now))
    }

    /// Night backdrop or the dark-mode setting.
    pub fn uses_dark_theme(&self, now: DateTime<Utc>) -> bool {
        self.settings.dark_mode || self.backdrop(now).is_some_and(|b| b.night)
    }

    pub(crate) fn show(&mut self, payload: WeatherPayload, at: DateTime<Utc>, cached: bool) {
        self.snapshot = Some(payload.snapshot);
        self.daily = payload.daily;
        self.hourly = payload.hourly;
        self.last_updated = Some(at);
        self.showing_cached = cached;
    }
}
