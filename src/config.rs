use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use chrono::{Duration as ChronoDuration, NaiveDate};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::{
    aggregate::{AggregateOptions, TieBreak},
    format::Units,
};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub network: NetworkConfig,
    pub display: DisplayConfig,
    pub forecast: ForecastConfig,
    pub chart: ChartConfig,
    pub units: UnitsConfig,
    pub refresh: RefreshConfig,
    pub labels: LabelsConfig,
    pub astro: AstroConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub api_url: String,
    pub api_key: String,
    pub location_id: String,
    pub language: String,
    /// UTC hours of day to keep from the forecast; empty keeps all
    pub allowed_hours: Vec<u32>,
    pub max_samples: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openweathermap.org/data/2.5".to_string(),
            api_key: String::new(),
            location_id: "2657896".to_string(),
            language: "en".to_string(),
            allowed_hours: Vec::new(),
            max_samples: 40,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    pub width: i32,
    pub height: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 480,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    pub max_days: usize,
    pub reference_hour: u32,
    pub max_gap_hours: i64,
    pub tie_break: TieBreak,
    pub skip_today: bool,
    pub min_day_column_width: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            max_days: 5,
            reference_hour: 12,
            max_gap_hours: 6,
            tie_break: TieBreak::Earliest,
            skip_today: true,
            min_day_column_width: 70,
        }
    }
}

/// Largest distance in hours between consecutive kept hours, wrapping
/// around midnight. `None` when every hour is kept.
pub fn max_hour_spacing(allowed_hours: &[u32]) -> Option<i64> {
    let mut hours: Vec<i64> = allowed_hours.iter().map(|h| i64::from(*h % 24)).collect();
    hours.sort_unstable();
    hours.dedup();

    let (first, last) = (*hours.first()?, *hours.last()?);
    let wrap = 24 - (last - first);
    let spacing = hours
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold(wrap, i64::max);
    Some(spacing)
}

impl ForecastConfig {
    /// Aggregation options for a refresh happening on `today`.
    ///
    /// The gap limit is widened to the spacing left by the provider's hour
    /// filter, otherwise every filtered sample would start a day of its own.
    pub fn aggregate_options(&self, today: NaiveDate, allowed_hours: &[u32]) -> AggregateOptions {
        let gap_hours = max_hour_spacing(allowed_hours)
            .map_or(self.max_gap_hours, |spacing| spacing.max(self.max_gap_hours));

        AggregateOptions {
            max_days: self.max_days,
            reference_hour: self.reference_hour,
            max_gap: ChronoDuration::hours(gap_hours),
            tie_break: self.tie_break,
            skip_date: self.skip_today.then_some(today),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartConfig {
    /// Narrowest slot that still fits an "00:00" label
    pub min_slot_pixel_width: u32,
    pub max_slots: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            min_slot_pixel_width: 35,
            max_slots: 12,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UnitsConfig {
    pub is_metric: bool,
    pub decimal_comma: bool,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            is_metric: true,
            decimal_comma: false,
        }
    }
}

impl UnitsConfig {
    pub fn units(&self) -> Units {
        Units::from_metric_flag(self.is_metric)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    pub update_interval_minutes: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            update_interval_minutes: 10,
        }
    }
}

/// Pre-translated strings; the dashboard never localizes on its own.
#[derive(Debug, Deserialize, Clone)]
pub struct LabelsConfig {
    /// Sunday first
    pub weekdays: Vec<String>,
    pub weekdays_abbr: Vec<String>,
    /// New moon first
    pub moon_phases: Vec<String>,
    /// North first, clockwise
    pub wind_directions: Vec<String>,
    pub sun_moon: Vec<String>,
    pub date_format: String,
    pub time_format: String,
}

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];
const WEEKDAYS_ABBR: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];
const MOON_PHASES: [&str; 8] = [
    "New Moon",
    "Waxing Crescent",
    "First Quarter",
    "Waxing Gibbous",
    "Full Moon",
    "Waning Gibbous",
    "Third Quarter",
    "Waning Crescent",
];
const WIND_DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
const SUN_MOON: [&str; 2] = ["Sun", "Moon"];

fn owned(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            weekdays: owned(&WEEKDAYS),
            weekdays_abbr: owned(&WEEKDAYS_ABBR),
            moon_phases: owned(&MOON_PHASES),
            wind_directions: owned(&WIND_DIRECTIONS),
            sun_moon: owned(&SUN_MOON),
            date_format: "%d.%m.%Y".to_string(),
            time_format: "%H:%M:%S".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AstroConfig {
    pub moon_phase_images: usize,
}

impl Default for AstroConfig {
    fn default() -> Self {
        Self {
            moon_phase_images: crate::icons::MOON_PHASE_IMAGES,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            network: NetworkConfig::default(),
            display: DisplayConfig::default(),
            forecast: ForecastConfig::default(),
            chart: ChartConfig::default(),
            units: UnitsConfig::default(),
            refresh: RefreshConfig::default(),
            labels: LabelsConfig::default(),
            astro: AstroConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    /// Load configuration, optionally layering one more file on top of the
    /// standard locations.
    pub fn load_with(extra_file: Option<&Path>) -> Result<Self> {
        // Load .env file (silently ignore if not present)
        let _ = dotenvy::dotenv();

        let api_key = std::env::var("OPENWEATHERMAP_API_KEY").unwrap_or_default();

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("weather-station");

        let mut builder = Config::builder()
            // 1. Load default values
            // Provider
            .set_default("provider.api_url", "https://api.openweathermap.org/data/2.5")?
            .set_default("provider.api_key", api_key)?
            .set_default("provider.location_id", "2657896")?
            .set_default("provider.language", "en")?
            .set_default("provider.allowed_hours", Vec::<i64>::new())?
            .set_default("provider.max_samples", 40)?
            // Network
            .set_default("network.request_timeout_secs", 30)?
            .set_default("network.connect_timeout_secs", 10)?
            // Display
            .set_default("display.width", 320)?
            .set_default("display.height", 480)?
            // Forecast
            .set_default("forecast.max_days", 5)?
            .set_default("forecast.reference_hour", 12)?
            .set_default("forecast.max_gap_hours", 6)?
            .set_default("forecast.tie_break", "earliest")?
            .set_default("forecast.skip_today", true)?
            .set_default("forecast.min_day_column_width", 70)?
            // Chart
            .set_default("chart.min_slot_pixel_width", 35)?
            .set_default("chart.max_slots", 12)?
            // Units
            .set_default("units.is_metric", true)?
            .set_default("units.decimal_comma", false)?
            // Refresh
            .set_default("refresh.update_interval_minutes", 10)?
            // Labels
            .set_default("labels.weekdays", WEEKDAYS.to_vec())?
            .set_default("labels.weekdays_abbr", WEEKDAYS_ABBR.to_vec())?
            .set_default("labels.moon_phases", MOON_PHASES.to_vec())?
            .set_default("labels.wind_directions", WIND_DIRECTIONS.to_vec())?
            .set_default("labels.sun_moon", SUN_MOON.to_vec())?
            .set_default("labels.date_format", "%d.%m.%Y")?
            .set_default("labels.time_format", "%H:%M:%S")?
            // Astro
            .set_default("astro.moon_phase_images", crate::icons::MOON_PHASE_IMAGES as i64)?

            // 2. Load from local config file (optional, lowest priority)
            .add_source(File::from(PathBuf::from("config.toml")).required(false))

            // 3. Load from user config directory (optional, overrides local)
            .add_source(File::from(config_dir.join("config.toml")).required(false));

        // 4. Explicit file from the command line (must exist)
        if let Some(path) = extra_file {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        // 5. Load from Environment variables (WEATHER__FORECAST__MAX_DAYS=...)
        let builder = builder.add_source(Environment::with_prefix("WEATHER").separator("__"));

        let config: AppConfig = builder
            .build()?
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the layout or aggregation code cannot use.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.forecast.reference_hour < 24,
            "forecast.reference_hour must be 0-23, got {}",
            self.forecast.reference_hour
        );
        ensure!(
            self.forecast.max_gap_hours > 0,
            "forecast.max_gap_hours must be positive"
        );
        ensure!(
            self.provider.allowed_hours.iter().all(|h| *h < 24),
            "provider.allowed_hours must only contain hours 0-23"
        );
        ensure!(
            self.display.width > 0 && self.display.height > 0,
            "display size must be positive, got {}x{}",
            self.display.width,
            self.display.height
        );
        ensure!(self.labels.weekdays.len() == 7, "labels.weekdays needs 7 entries");
        ensure!(
            self.labels.weekdays_abbr.len() == 7,
            "labels.weekdays_abbr needs 7 entries"
        );
        ensure!(
            self.labels.moon_phases.len() == crate::icons::NAMED_MOON_PHASES,
            "labels.moon_phases needs {} entries",
            crate::icons::NAMED_MOON_PHASES
        );
        ensure!(
            self.labels.wind_directions.len() == 8,
            "labels.wind_directions needs 8 entries"
        );
        ensure!(self.labels.sun_moon.len() == 2, "labels.sun_moon needs 2 entries");
        ensure!(
            self.astro.moon_phase_images > 0,
            "astro.moon_phase_images must be positive"
        );
        Ok(())
    }
}
