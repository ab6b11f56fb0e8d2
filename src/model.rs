use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single forecast sample as delivered by the weather provider.
///
/// Temperatures are always in °C and wind speeds in m/s; conversion to the
/// display unit happens in [`crate::format`] only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub observation_time: DateTime<Utc>,
    pub temp: f64,
    pub condition_code: i32,
    pub wind_speed: f64,
    pub wind_deg: i32,
}

/// Current conditions shown in the top panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub observation_time: DateTime<Utc>,
    pub temp: f64,
    pub feels_like: f64,
    pub condition_code: i32,
    pub description: String,
    pub humidity: u8,
    pub pressure: u16,
    pub wind_speed: f64,
    pub wind_deg: i32,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub city_name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Everything one refresh cycle needs from the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    pub samples: Vec<ForecastSample>,
}

impl WeatherSnapshot {
    /// Load a snapshot previously written as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))
    }

    /// Write the snapshot as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).context("Failed to serialize snapshot")?;
        std::fs::write(path, raw)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))
    }
}

/// Aggregated forecast for one local calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    /// Local calendar date of the run.
    pub date: NaiveDate,
    /// Day of week (0=Sunday, 6=Saturday)
    pub day_index: u8,
    pub min_temp: f64,
    pub max_temp: f64,
    /// Condition of the sample closest to the reference hour.
    pub condition_code: i32,
    /// Local hour (0-23) of that sample.
    pub condition_hour: u32,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn make_snapshot() -> WeatherSnapshot {
        let t = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        WeatherSnapshot {
            current: CurrentConditions {
                observation_time: t,
                temp: 21.4,
                feels_like: 20.9,
                condition_code: 801,
                description: "few clouds".to_string(),
                humidity: 54,
                pressure: 1016,
                wind_speed: 3.6,
                wind_deg: 230,
                sunrise: Utc.with_ymd_and_hms(2024, 6, 15, 3, 15, 0).unwrap(),
                sunset: Utc.with_ymd_and_hms(2024, 6, 15, 19, 20, 0).unwrap(),
                city_name: "Zurich".to_string(),
                lat: 47.37,
                lon: 8.54,
            },
            samples: vec![ForecastSample {
                observation_time: t,
                temp: 21.0,
                condition_code: 800,
                wind_speed: 2.0,
                wind_deg: 180,
            }],
        }
    }

    #[test]
    fn test_snapshot_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let snapshot = make_snapshot();

        snapshot.save(&path).unwrap();
        let loaded = WeatherSnapshot::load(&path).unwrap();

        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_snapshot_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = WeatherSnapshot::load(&dir.path().join("nope.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_snapshot_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = WeatherSnapshot::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse snapshot"));
    }
}
