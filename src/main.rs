use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use weather_station::{
    config::AppConfig,
    refresh::{SnapshotSource, refresh_once},
    traits::{FrameSink, JsonSink, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "weather-station")]
#[command(about = "Weather dashboard frame generator")]
struct Args {
    /// Refresh once and exit
    #[arg(long)]
    once: bool,

    /// Read weather data from a JSON snapshot instead of the provider
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Write frames to this file instead of stdout
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Additional configuration file, applied before environment variables
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Save every fetched snapshot to this file for later replay
    #[arg(long, value_name = "PATH")]
    save_snapshot: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    weather_station::logging::init();

    let config = AppConfig::load_with(args.config.as_deref())
        .context("Failed to load configuration")?;
    let config = Arc::new(config);

    let source = SnapshotSource::from_config(&config, args.snapshot.clone())?;
    let sink: Box<dyn FrameSink> = match &args.output {
        Some(path) => Box::new(JsonSink::file(path)),
        None => Box::new(JsonSink::stdout()),
    };

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    if args.once {
        rt.block_on(refresh_once(
            &source,
            &config,
            &SystemClock,
            &Local,
            sink.as_ref(),
            args.save_snapshot.as_ref(),
        ))?;
        Ok(())
    } else {
        run_daemon(rt, config, source, sink, args.save_snapshot)
    }
}

/// Refresh on a fixed interval until the process is stopped.
fn run_daemon(
    rt: tokio::runtime::Runtime,
    config: Arc<AppConfig>,
    source: SnapshotSource,
    sink: Box<dyn FrameSink>,
    save_snapshot: Option<PathBuf>,
) -> Result<()> {
    rt.block_on(async {
        let interval_minutes = config.refresh.update_interval_minutes.max(1);
        tracing::info!(
            "Starting weather station, refreshing every {} minutes",
            interval_minutes
        );

        let mut interval = tokio::time::interval(Duration::from_secs(interval_minutes * 60));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            if let Err(e) = refresh_once(
                &source,
                &config,
                &SystemClock,
                &Local,
                sink.as_ref(),
                save_snapshot.as_ref(),
            )
            .await
            {
                tracing::error!("Refresh failed: {:#}", e);
            }
        }
    })
}
