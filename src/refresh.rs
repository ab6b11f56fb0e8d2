//! One refresh cycle: fetch, compose, publish.

use std::{fmt::Display, path::PathBuf};

use anyhow::{Context, Result};
use chrono::TimeZone;
use tracing::{debug, info};

use crate::{
    api::OpenWeatherMapClient,
    config::AppConfig,
    dashboard::{Frame, build_frame},
    model::WeatherSnapshot,
    traits::{Clock, FrameSink},
};

/// Where a refresh gets its weather data from.
#[derive(Debug, Clone)]
pub enum SnapshotSource {
    Provider(OpenWeatherMapClient),
    /// A JSON snapshot on disk, re-read on every refresh
    File(PathBuf),
}

impl SnapshotSource {
    pub fn from_config(config: &AppConfig, snapshot: Option<PathBuf>) -> Result<Self> {
        match snapshot {
            Some(path) => Ok(SnapshotSource::File(path)),
            None => {
                let client = OpenWeatherMapClient::new(&config.provider, &config.network)
                    .context("Failed to create weather provider client")?;
                Ok(SnapshotSource::Provider(client))
            }
        }
    }

    pub async fn load(&self) -> Result<WeatherSnapshot> {
        match self {
            SnapshotSource::Provider(client) => client
                .fetch_snapshot()
                .await
                .context("Failed to fetch weather data"),
            SnapshotSource::File(path) => WeatherSnapshot::load(path),
        }
    }
}

/// Run a single refresh and hand the frame to `sink`.
///
/// When `save_to` is set the raw snapshot is written there first, so the
/// cycle can be replayed later with [`SnapshotSource::File`].
pub async fn refresh_once<C, Tz, S>(
    source: &SnapshotSource,
    config: &AppConfig,
    clock: &C,
    tz: &Tz,
    sink: &S,
    save_to: Option<&PathBuf>,
) -> Result<Frame>
where
    C: Clock + ?Sized,
    Tz: TimeZone,
    Tz::Offset: Display,
    S: FrameSink + ?Sized,
{
    let snapshot = source.load().await?;
    debug!(
        samples = snapshot.samples.len(),
        city = %snapshot.current.city_name,
        "Loaded snapshot"
    );

    if let Some(path) = save_to {
        snapshot.save(path)?;
    }

    let frame = build_frame(&snapshot, config, clock, tz);
    sink.publish(&frame).context("Failed to publish frame")?;
    info!(days = frame.days.len(), "Published frame");

    Ok(frame)
}
