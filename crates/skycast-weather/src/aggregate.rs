//! Forecast aggregation: raw forecast entries to hourly and daily summaries.
//!
//! Both functions are pure. Local times are computed in the provider-local
//! offset passed by the caller.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};

use crate::types::{Condition, DailySummary, DayHour, ForecastEntry, HourlySummary};

/// Number of raw entries examined for the hourly strip
pub const HOURLY_WINDOW: usize = 8;

/// Number of days kept in the daily list
pub const DAILY_DAYS: usize = 5;

/// Label of the hourly entry that falls in the current hour
pub const NOW_LABEL: &str = "now";

const MS_TO_KMH: f64 = 3.6;

/// Build the near-term hourly strip.
///
/// Only the first [`HOURLY_WINDOW`] entries are examined; of those, entries
/// earlier than `now` are dropped. The first surviving entry whose local hour
/// equals the local hour of `now` is flagged and labelled [`NOW_LABEL`].
pub fn build_hourly(
    entries: &[ForecastEntry],
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Vec<HourlySummary> {
    let current_hour = now.with_timezone(&offset).hour();
    let mut marked = false;

    entries
        .iter()
        .take(HOURLY_WINDOW)
        .filter(|entry| entry.time >= now)
        .map(|entry| {
            let local = entry.time.with_timezone(&offset);
            let is_current_hour = !marked && local.hour() == current_hour;
            if is_current_hour {
                marked = true;
            }

            HourlySummary {
                time: entry.time,
                label: if is_current_hour {
                    NOW_LABEL.to_string()
                } else {
                    clock_label(local)
                },
                hour: local.hour(),
                temperature: round(entry.temperature),
                feels_like: round(entry.feels_like),
                humidity: entry.humidity,
                wind_kmh: round(entry.wind_speed * MS_TO_KMH),
                pressure: entry.pressure,
                precipitation_chance: percent(entry.precipitation_probability),
                icon: entry.condition.icon.clone(),
                description: entry.condition.description.clone(),
                is_current_hour,
            }
        })
        .collect()
}

/// Running fold state for one calendar day
struct DayAccumulator {
    temp_max: f64,
    temp_min: f64,
    dominant: Condition,
    hourly: Vec<DayHour>,
}

impl DayAccumulator {
    fn seed(entry: &ForecastEntry) -> Self {
        Self {
            temp_max: entry.temp_max,
            temp_min: entry.temp_min,
            dominant: entry.condition.clone(),
            hourly: Vec::new(),
        }
    }

    fn absorb(&mut self, entry: &ForecastEntry, offset: FixedOffset) {
        self.temp_max = self.temp_max.max(entry.temp_max);
        self.temp_min = self.temp_min.min(entry.temp_min);

        // Strictly greater: the first-seen condition wins ties
        if entry.condition.severity() > self.dominant.severity() {
            self.dominant = entry.condition.clone();
        }

        let local = entry.time.with_timezone(&offset);
        self.hourly.push(DayHour {
            time: entry.time,
            label: clock_label(local),
            hour: local.hour(),
            temperature: round(entry.temperature),
            feels_like: round(entry.feels_like),
            humidity: entry.humidity,
            wind_kmh: round(entry.wind_speed * MS_TO_KMH),
            pressure: entry.pressure,
            precipitation_chance: percent(entry.precipitation_probability),
            icon: entry.condition.icon.clone(),
            description: entry.condition.description.clone(),
        });
    }
}

/// Group forecast entries by provider-local calendar date.
///
/// Returns at most [`DAILY_DAYS`] days in ascending date order. Each day's
/// high and low are the extremes over its entries; its dominant condition is
/// the most severe one, first seen on ties.
pub fn build_daily(entries: &[ForecastEntry], offset: FixedOffset) -> Vec<DailySummary> {
    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();

    for entry in entries {
        let date = entry.time.with_timezone(&offset).date_naive();
        days.entry(date)
            .or_insert_with(|| DayAccumulator::seed(entry))
            .absorb(entry, offset);
    }

    days.into_iter()
        .take(DAILY_DAYS)
        .map(|(date, day)| DailySummary {
            date_key: date.format("%Y-%m-%d").to_string(),
            date,
            temp_max: round(day.temp_max),
            temp_min: round(day.temp_min),
            dominant_condition: day.dominant,
            hourly: day.hourly,
        })
        .collect()
}

fn clock_label(local: DateTime<FixedOffset>) -> String {
    local.format("%H:%M").to_string()
}

/// Round half toward positive infinity.
fn round(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn percent(fraction: f64) -> u8 {
    round(fraction * 100.0).clamp(0, 100) as u8
}
