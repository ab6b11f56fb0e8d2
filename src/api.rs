use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    config::{NetworkConfig, ProviderConfig},
    model::{CurrentConditions, ForecastSample, WeatherSnapshot},
};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No OpenWeatherMap API key configured")]
    MissingApiKey,

    #[error("Failed to create HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("Invalid URL for {endpoint}: {message}")]
    Url {
        endpoint: &'static str,
        message: String,
    },

    #[error("Failed to send request to {endpoint}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("API returned error status for {endpoint}: {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("Failed to parse {endpoint} response")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid unix timestamp {0} in current conditions")]
    InvalidTimestamp(i64),
}

// ==================== Response Types ====================

#[derive(Debug, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    pub id: i32,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct MainValues {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub pressure: u16,
    #[serde(default)]
    pub humidity: u8,
}

#[derive(Debug, Deserialize, Default)]
pub struct Wind {
    pub speed: f64,
    #[serde(default)]
    pub deg: i32,
}

#[derive(Debug, Deserialize)]
pub struct Sys {
    pub sunrise: i64,
    pub sunset: i64,
}

/// Response of the `weather` (current conditions) endpoint.
#[derive(Debug, Deserialize)]
pub struct CurrentResponse {
    pub coord: Coord,
    pub weather: Vec<Condition>,
    pub main: MainValues,
    #[serde(default)]
    pub wind: Wind,
    pub dt: i64,
    pub sys: Sys,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: MainValues,
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Wind,
}

/// Response of the `forecast` (3-hourly, 5 days) endpoint.
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub list: Vec<ForecastEntry>,
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

impl CurrentResponse {
    pub fn into_conditions(self) -> Result<CurrentConditions, ProviderError> {
        let observation_time = timestamp(self.dt).ok_or(ProviderError::InvalidTimestamp(self.dt))?;
        let sunrise =
            timestamp(self.sys.sunrise).ok_or(ProviderError::InvalidTimestamp(self.sys.sunrise))?;
        let sunset =
            timestamp(self.sys.sunset).ok_or(ProviderError::InvalidTimestamp(self.sys.sunset))?;
        let (condition_code, description) = self
            .weather
            .into_iter()
            .next()
            .map(|c| (c.id, c.description))
            .unwrap_or_default();

        Ok(CurrentConditions {
            observation_time,
            temp: self.main.temp,
            feels_like: self.main.feels_like.unwrap_or(self.main.temp),
            condition_code,
            description,
            humidity: self.main.humidity,
            pressure: self.main.pressure,
            wind_speed: self.wind.speed,
            wind_deg: self.wind.deg,
            sunrise,
            sunset,
            city_name: self.name,
            lat: self.coord.lat,
            lon: self.coord.lon,
        })
    }
}

/// Which forecast entries make it into a snapshot.
#[derive(Debug, Clone, Default)]
pub struct SampleFilter {
    /// UTC hours to keep; empty keeps every hour
    pub allowed_hours: Vec<u32>,
    pub max_samples: usize,
}

impl SampleFilter {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            allowed_hours: config.allowed_hours.clone(),
            max_samples: config.max_samples,
        }
    }

    fn allows(&self, time: &DateTime<Utc>) -> bool {
        self.allowed_hours.is_empty() || self.allowed_hours.contains(&time.hour())
    }

    /// Convert and filter forecast entries. Entries with an unusable
    /// timestamp are dropped.
    pub fn apply(&self, entries: Vec<ForecastEntry>) -> Vec<ForecastSample> {
        entries
            .into_iter()
            .filter_map(|entry| {
                let Some(observation_time) = timestamp(entry.dt) else {
                    warn!(dt = entry.dt, "Dropping forecast entry with invalid timestamp");
                    return None;
                };
                Some(ForecastSample {
                    observation_time,
                    temp: entry.main.temp,
                    condition_code: entry.weather.first().map_or(0, |c| c.id),
                    wind_speed: entry.wind.speed,
                    wind_deg: entry.wind.deg,
                })
            })
            .filter(|sample| self.allows(&sample.observation_time))
            .take(self.max_samples)
            .collect()
    }
}

// ==================== Client ====================

/// Client for the OpenWeatherMap 2.5 API.
#[derive(Clone, Debug)]
pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    location_id: String,
    language: String,
    filter: SampleFilter,
}

impl OpenWeatherMapClient {
    /// Create a new API client with configurable timeouts.
    pub fn new(provider: &ProviderConfig, network: &NetworkConfig) -> Result<Self, ProviderError> {
        if provider.api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network.request_timeout_secs))
            .connect_timeout(Duration::from_secs(network.connect_timeout_secs))
            .build()
            .map_err(ProviderError::Client)?;

        Ok(Self {
            client,
            base_url: provider.api_url.trim_end_matches('/').to_string(),
            api_key: provider.api_key.clone(),
            location_id: provider.location_id.clone(),
            language: provider.language.clone(),
            filter: SampleFilter::from_config(provider),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str) -> Result<T, ProviderError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/{}", self.base_url, endpoint),
            [
                ("id", self.location_id.as_str()),
                ("appid", self.api_key.as_str()),
                // aggregation and layout work in °C and m/s only
                ("units", "metric"),
                ("lang", self.language.as_str()),
            ],
        )
        .map_err(|e| ProviderError::Url {
            endpoint,
            message: e.to_string(),
        })?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ProviderError::Request { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status { endpoint, status });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| ProviderError::Parse { endpoint, source })
    }

    pub async fn fetch_current(&self) -> Result<CurrentConditions, ProviderError> {
        self.get_json::<CurrentResponse>("weather")
            .await?
            .into_conditions()
    }

    pub async fn fetch_forecast(&self) -> Result<Vec<ForecastSample>, ProviderError> {
        let response = self.get_json::<ForecastResponse>("forecast").await?;
        let received = response.list.len();
        let samples = self.filter.apply(response.list);
        debug!(received, kept = samples.len(), "Fetched forecast");
        Ok(samples)
    }

    /// Fetch current conditions and forecast for one refresh cycle.
    pub async fn fetch_snapshot(&self) -> Result<WeatherSnapshot, ProviderError> {
        let (current, samples) = tokio::try_join!(self.fetch_current(), self.fetch_forecast())?;
        Ok(WeatherSnapshot { current, samples })
    }
}
