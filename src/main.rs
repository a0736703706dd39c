//! Skycast command-line client.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use skycast_core::{Config, ConfigError, Units};
use skycast_services::{AppState, FetchOutcome, Screen, UpdateChecker, WeatherOrchestrator};
use skycast_weather::{
    DailySummary, FixedLocation, HttpProbe, KeyValueStore, SqliteStore, WeatherProvider,
    WeatherQuery,
};

const PROBE_TIMEOUT_SECS: u64 = 5;
const MS_TO_KMH: f64 = 3.6;

#[derive(Parser)]
#[command(name = "skycast")]
#[command(author, version, about = "Current weather and forecasts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Weather for a city
    City {
        name: String,

        /// Also print the hourly breakdown of this day (0 = first day)
        #[arg(long)]
        day: Option<usize>,
    },

    /// Weather at a position
    Coords {
        #[arg(allow_hyphen_values = true)]
        latitude: f64,

        #[arg(allow_hyphen_values = true)]
        longitude: f64,

        #[arg(long)]
        day: Option<usize>,
    },

    /// Weather at the configured device location
    Here {
        #[arg(long)]
        day: Option<usize>,
    },

    /// Re-fetch the last shown place
    Refresh,

    /// Show the last result without fetching
    Show,

    /// List or clear recent searches
    History {
        #[arg(long)]
        clear: bool,
    },

    /// Toggle dark mode
    Theme,

    /// Check for a newer release
    CheckUpdate,
}

#[tokio::main]
async fn main() -> Result<()> {
    skycast_core::init()?;
    let cli = Cli::parse();

    let (config, _) = Config::load_validated().inspect_err(|e| {
        if let Some(config_error) = e.downcast_ref::<ConfigError>() {
            eprintln!("{}", config_error.user_message());
        }
    })?;
    let store: Arc<dyn KeyValueStore> = Arc::new(
        SqliteStore::open(config.database_path()).context("Failed to open local store")?,
    );
    let provider = WeatherProvider::new(&config.weather)?;
    let probe = HttpProbe::new(
        config.weather.base_url.clone(),
        Duration::from_secs(PROBE_TIMEOUT_SECS),
    )?;
    let orchestrator = Arc::new(WeatherOrchestrator::new(
        &config,
        provider,
        store,
        Arc::new(probe),
    ));

    if let Err(e) = orchestrator.restore() {
        tracing::warn!("Failed to restore saved state: {}", e);
    }

    let locator = FixedLocation::from_config(&config.location);
    let units = config.weather.units;
    let checked_update = matches!(cli.command, Commands::CheckUpdate);

    match cli.command {
        Commands::City { name, day } => {
            let outcome = orchestrator.fetch(WeatherQuery::city(name)).await;
            report(&orchestrator.state(), &outcome, units, day);
        }
        Commands::Coords {
            latitude,
            longitude,
            day,
        } => {
            let outcome = orchestrator
                .fetch(WeatherQuery::coordinates(latitude, longitude))
                .await;
            report(&orchestrator.state(), &outcome, units, day);
        }
        Commands::Here { day } => {
            let outcome = orchestrator.fetch_current_location(&locator).await;
            report(&orchestrator.state(), &outcome, units, day);
        }
        Commands::Refresh => {
            let outcome = orchestrator.refresh(&locator).await;
            report(&orchestrator.state(), &outcome, units, None);
        }
        Commands::Show => {
            let state = orchestrator.state();
            if state.screen() == Screen::Weather {
                print_weather(&state, units);
            } else {
                println!("Nothing fetched in the last {} minutes.", config.cache.ttl_minutes);
            }
        }
        Commands::History { clear } => {
            if clear {
                orchestrator.clear_history()?;
                println!("Search history cleared.");
            } else {
                let state = orchestrator.state();
                if state.history.is_empty() {
                    println!("No recent searches.");
                }
                for (i, name) in state.history.entries().iter().enumerate() {
                    println!("{:>2}. {}", i + 1, name);
                }
            }
        }
        Commands::Theme => {
            let dark = orchestrator.toggle_dark_mode()?;
            println!("Dark mode {}.", if dark { "on" } else { "off" });
        }
        Commands::CheckUpdate => {
            check_update(&config, true).await?;
        }
    }

    if config.update.check_on_start && !checked_update {
        if let Err(e) = check_update(&config, false).await {
            tracing::debug!("Update check failed: {}", e);
        }
    }

    Ok(())
}

async fn check_update(config: &Config, verbose: bool) -> Result<()> {
    let checker = UpdateChecker::new(&config.update)?;
    match checker.check(env!("CARGO_PKG_VERSION")).await? {
        Some(info) => {
            let kind = if info.force_update { "Required update" } else { "Update" };
            println!("{} available: {}", kind, info.latest_version);
            if let Some(url) = info.download_url {
                println!("Download: {}", url);
            }
        }
        None if verbose => println!("Skycast {} is up to date.", env!("CARGO_PKG_VERSION")),
        None => {}
    }
    Ok(())
}

fn report(state: &AppState, outcome: &FetchOutcome, units: Units, day: Option<usize>) {
    if let Some(error) = outcome.error() {
        println!("! {}", error.user_message());
    }

    match state.screen() {
        Screen::Weather => {
            if state.showing_cached {
                println!("(showing saved data)");
            }
            print_weather(state, units);
            if let Some(index) = day {
                match state.day_detail(index) {
                    Some(detail) => print_day(detail, units),
                    None => println!("No forecast for day {}.", index),
                }
            }
        }
        Screen::Offline => println!("You are offline and no saved weather is available."),
        Screen::Error | Screen::Intro | Screen::Loading => {}
    }
}

fn print_weather(state: &AppState, units: Units) {
    let Some(snapshot) = state.snapshot.as_ref() else {
        return;
    };
    let unit = units.temperature_suffix();
    let now = chrono::Utc::now();

    let place = match snapshot.country.as_deref() {
        Some(country) => format!("{}, {}", snapshot.location_name, country),
        None => snapshot.location_name.clone(),
    };
    let theme = if state.uses_dark_theme(now) { "dark" } else { "light" };
    println!("{}  [{}, {}]", place, snapshot.backdrop(now).key(), theme);
    println!(
        "  {:.0}{}  {} (feels like {:.0}{})",
        snapshot.temperature, unit, snapshot.condition.description, snapshot.feels_like, unit
    );
    println!(
        "  humidity {}%  pressure {:.0} hPa  wind {:.0} km/h",
        snapshot.humidity,
        snapshot.pressure,
        snapshot.wind_speed * MS_TO_KMH
    );
    if let Some(updated) = state.last_updated {
        println!("  updated {}", updated.format("%Y-%m-%d %H:%M UTC"));
    }

    if !state.hourly.is_empty() {
        println!();
        for hour in &state.hourly {
            println!(
                "  {:>5}  {:>4}{}  {:>3}%  {}",
                hour.label, hour.temperature, unit, hour.precipitation_chance, hour.description
            );
        }
    }

    if !state.daily.is_empty() {
        let today = now.with_timezone(&snapshot.utc_offset()).date_naive();
        println!();
        for (i, day) in state.daily.iter().enumerate() {
            let date = if day.is_today(today) {
                "Today".to_string()
            } else {
                day.date.format("%a %d %b").to_string()
            };
            println!(
                "  [{}] {:<10}  {:>4}{} / {:>4}{}  {}",
                i,
                date,
                day.temp_max,
                unit,
                day.temp_min,
                unit,
                day.dominant_condition.description
            );
        }
    }
}

fn print_day(day: &DailySummary, units: Units) {
    let unit = units.temperature_suffix();
    println!();
    println!(
        "{} (around {}{})",
        day.date.format("%A %d %B"),
        day.representative_temperature(),
        unit
    );
    for hour in &day.hourly {
        println!(
            "  {:>5}  {:>4}{}  feels {:>4}{}  {:>3}%  {:>3} km/h  {:.0} hPa  {}",
            hour.label,
            hour.temperature,
            unit,
            hour.feels_like,
            unit,
            hour.humidity,
            hour.wind_kmh,
            hour.pressure,
            hour.description
        );
    }
}
