//! OpenWeatherMap-compatible client for current conditions and the 5-day forecast.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use skycast_core::{NetworkError, ReqwestErrorExt, Units, WeatherConfig, WeatherError};

use crate::types::{
    Condition, Coordinates, ForecastEntry, WeatherBundle, WeatherQuery, WeatherSnapshot,
};

const CURRENT_ENDPOINT: &str = "weather";
const FORECAST_ENDPOINT: &str = "forecast";

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    api_key: Option<String>,
    units: Units,
    lang: String,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        Ok(Self {
            client: Arc::new(client),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            units: config.units,
            lang: config.lang.clone(),
        })
    }

    /// Fetch current conditions and the forecast concurrently. Fails if either fails.
    pub async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherBundle, WeatherError> {
        query.validate()?;
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("No weather API key configured");
            return Err(WeatherError::InvalidApiKey);
        };

        tracing::debug!("Fetching weather for {}", query);

        let (current, forecast) = tokio::try_join!(
            self.get_json::<CurrentResponse>(CURRENT_ENDPOINT, query, api_key),
            self.get_json::<ForecastResponse>(FORECAST_ENDPOINT, query, api_key),
        )?;

        let utc_offset_secs = forecast
            .city
            .as_ref()
            .and_then(|c| c.timezone)
            .or(current.timezone)
            .unwrap_or(0);

        let snapshot = current.into_snapshot(self.units);
        let forecast = forecast
            .list
            .into_iter()
            .map(|item| item.into_entry(self.units))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            "Fetched weather for {}: {} forecast entries",
            snapshot.location_name,
            forecast.len()
        );

        Ok(WeatherBundle {
            snapshot,
            forecast,
            utc_offset_secs,
        })
    }

    fn query_params(&self, query: &WeatherQuery, api_key: &str) -> Vec<(&'static str, String)> {
        let mut params = match query {
            WeatherQuery::City(name) => vec![("q", name.trim().to_string())],
            WeatherQuery::Coordinates(c) => vec![
                ("lat", c.latitude.to_string()),
                ("lon", c.longitude.to_string()),
            ],
        };
        params.push(("appid", api_key.to_string()));
        params.push(("units", self.units.as_query().to_string()));
        params.push(("lang", self.lang.clone()));
        params
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &WeatherQuery,
        api_key: &str,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(&self.query_params(query, api_key))
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(body);
            tracing::warn!("Weather API {} returned {}: {}", endpoint, status, message);
            return Err(WeatherError::from_status(
                status.as_u16(),
                &query.to_string(),
                message,
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct WireCondition {
    id: u32,
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WireMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: f64,
    humidity: u8,
}

#[derive(Debug, Default, Deserialize)]
struct WireWind {
    #[serde(default)]
    speed: f64,
    deg: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct WireSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    coord: WireCoord,
    #[serde(default)]
    weather: Vec<WireCondition>,
    main: WireMain,
    visibility: Option<u32>,
    #[serde(default)]
    wind: WireWind,
    dt: i64,
    #[serde(default)]
    sys: WireSys,
    timezone: Option<i32>,
    #[serde(default)]
    name: String,
}

impl CurrentResponse {
    fn into_snapshot(self, units: Units) -> WeatherSnapshot {
        WeatherSnapshot {
            location_name: self.name,
            country: self.sys.country,
            coordinates: Coordinates::new(self.coord.lat, self.coord.lon),
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            temp_min: self.main.temp_min,
            temp_max: self.main.temp_max,
            humidity: self.main.humidity,
            pressure: self.main.pressure,
            visibility: self.visibility,
            wind_speed: units.wind_speed_to_ms(self.wind.speed),
            wind_direction: self.wind.deg,
            condition: first_condition(self.weather),
            sunrise: self.sys.sunrise,
            sunset: self.sys.sunset,
            observed_at: self.dt,
            timezone_offset: self.timezone.unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireForecastItem {
    dt: i64,
    main: WireMain,
    #[serde(default)]
    weather: Vec<WireCondition>,
    #[serde(default)]
    wind: WireWind,
    #[serde(default)]
    pop: f64,
}

impl WireForecastItem {
    /// Wind speed is normalized to m/s whatever unit system was requested.
    fn into_entry(self, units: Units) -> Result<ForecastEntry, WeatherError> {
        let time = DateTime::<Utc>::from_timestamp(self.dt, 0).ok_or_else(|| {
            NetworkError::InvalidResponse(format!("forecast timestamp out of range: {}", self.dt))
        })?;

        Ok(ForecastEntry {
            time,
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            temp_min: self.main.temp_min,
            temp_max: self.main.temp_max,
            pressure: self.main.pressure,
            humidity: self.main.humidity,
            condition: first_condition(self.weather),
            wind_speed: units.wind_speed_to_ms(self.wind.speed),
            precipitation_probability: self.pop,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireCity {
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<WireForecastItem>,
    city: Option<WireCity>,
}

fn first_condition(list: Vec<WireCondition>) -> Condition {
    list.into_iter()
        .next()
        .map(|c| Condition {
            code: c.id,
            main: c.main,
            description: c.description,
            icon: c.icon,
        })
        .unwrap_or_else(|| Condition {
            code: 0,
            main: "Unknown".to_string(),
            description: String::new(),
            icon: String::new(),
        })
}
