//! Seams between the dashboard core and the outside world.
//!
//! - `Clock`: what "now" is, so refreshes can be replayed deterministically
//! - `FrameSink`: where finished frames go (the external renderer)

use std::{
    fs,
    io::Write,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::dashboard::Frame;

// ==================== Clock Trait ====================

/// Source of the current time. Conversion to the display's wall clock is
/// up to the caller's timezone.
pub trait Clock: Send + Sync {
    /// Get the current time in UTC.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock clock for testing with controllable time.
#[derive(Debug, Clone)]
pub struct MockClock {
    utc_time: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            utc_time: Arc::new(Mutex::new(time)),
        }
    }

    pub fn set_time(&self, time: DateTime<Utc>) {
        *self.utc_time.lock().unwrap() = time;
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: chrono::Duration) {
        let mut time = self.utc_time.lock().unwrap();
        *time += duration;
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.utc_time.lock().unwrap()
    }
}

// ==================== FrameSink Trait ====================

/// Receiver of finished frames.
pub trait FrameSink: Send + Sync {
    fn publish(&self, frame: &Frame) -> Result<()>;
}

#[derive(Debug, Clone)]
enum JsonTarget {
    /// One compact JSON document per line
    Stdout,
    /// Pretty JSON, replaced on every frame
    File(PathBuf),
}

/// Hands frames to the renderer as JSON.
#[derive(Debug, Clone)]
pub struct JsonSink {
    target: JsonTarget,
}

impl JsonSink {
    pub fn stdout() -> Self {
        Self {
            target: JsonTarget::Stdout,
        }
    }

    /// Keep only the latest frame in `path`. The file is written next to
    /// its final name and renamed, so a polling renderer never reads half a
    /// frame.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            target: JsonTarget::File(path.into()),
        }
    }
}

impl FrameSink for JsonSink {
    fn publish(&self, frame: &Frame) -> Result<()> {
        match &self.target {
            JsonTarget::Stdout => {
                let line = serde_json::to_string(frame).context("Failed to serialize frame")?;
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", line).context("Failed to write frame to stdout")?;
                stdout.flush()?;
            }
            JsonTarget::File(path) => {
                let json =
                    serde_json::to_string_pretty(frame).context("Failed to serialize frame")?;
                let partial = path.with_extension("partial");
                fs::write(&partial, json)
                    .with_context(|| format!("Failed to write {}", partial.display()))?;
                fs::rename(&partial, path)
                    .with_context(|| format!("Failed to replace {}", path.display()))?;
            }
        }
        Ok(())
    }
}

/// Mock sink for testing that records all published frames.
#[derive(Debug, Clone, Default)]
pub struct MockSink {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.frames.lock().unwrap().last().cloned()
    }

    pub fn clear(&self) {
        self.frames.lock().unwrap().clear();
    }

    pub fn was_called(&self) -> bool {
        !self.frames.lock().unwrap().is_empty()
    }
}

impl FrameSink for MockSink {
    fn publish(&self, frame: &Frame) -> Result<()> {
        self.frames.lock().unwrap().push(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::*;
    use crate::{
        config::AppConfig,
        dashboard::build_frame,
        model::{CurrentConditions, WeatherSnapshot},
    };

    fn sample_frame() -> Frame {
        let time = Utc.with_ymd_and_hms(2024, 6, 15, 14, 30, 0).unwrap();
        let snapshot = WeatherSnapshot {
            current: CurrentConditions {
                observation_time: time,
                temp: 18.0,
                feels_like: 17.5,
                condition_code: 500,
                description: "light rain".to_string(),
                humidity: 80,
                pressure: 1009,
                wind_speed: 5.0,
                wind_deg: 270,
                sunrise: Utc.with_ymd_and_hms(2024, 6, 15, 3, 30, 0).unwrap(),
                sunset: Utc.with_ymd_and_hms(2024, 6, 15, 19, 25, 0).unwrap(),
                city_name: "Bern".to_string(),
                lat: 46.95,
                lon: 7.45,
            },
            samples: Vec::new(),
        };
        let tz = FixedOffset::east_opt(3600).unwrap();
        build_frame(&snapshot, &AppConfig::default(), &MockClock::new(time), &tz)
    }

    #[test]
    fn test_system_clock_returns_current_time() {
        let clock = SystemClock;
        let before = Utc::now();
        let clock_time = clock.now_utc();
        let after = Utc::now();

        assert!(clock_time >= before);
        assert!(clock_time <= after);
    }

    #[test]
    fn test_mock_clock_returns_set_time() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 6, 15, 14, 30, 0).unwrap();
        let clock = MockClock::new(fixed_time);

        assert_eq!(clock.now_utc(), fixed_time);
        // reading does not advance a mock clock
        assert_eq!(clock.now_utc(), clock.now_utc());
    }

    #[test]
    fn test_mock_clock_can_be_updated() {
        let time1 = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let time2 = Utc.with_ymd_and_hms(2024, 6, 15, 14, 0, 0).unwrap();

        let clock = MockClock::new(time1);
        clock.set_time(time2);
        assert_eq!(clock.now_utc(), time2);
    }

    #[test]
    fn test_mock_clock_advance() {
        let start = Utc.with_ymd_and_hms(2024, 6, 15, 23, 0, 0).unwrap();
        let clock = MockClock::new(start);

        clock.advance(chrono::Duration::hours(2));

        let expected = Utc.with_ymd_and_hms(2024, 6, 16, 1, 0, 0).unwrap();
        assert_eq!(clock.now_utc(), expected);
    }

    #[test]
    fn test_mock_sink_records_frames() {
        let sink = MockSink::new();
        assert!(!sink.was_called());

        let frame = sample_frame();
        sink.publish(&frame).unwrap();
        sink.publish(&frame).unwrap();

        assert!(sink.was_called());
        assert_eq!(sink.frame_count(), 2);
        assert_eq!(sink.last_frame(), Some(frame));
    }

    #[test]
    fn test_mock_sink_clear() {
        let sink = MockSink::new();
        sink.publish(&sample_frame()).unwrap();

        sink.clear();
        assert!(!sink.was_called());
        assert_eq!(sink.frame_count(), 0);
        assert!(sink.last_frame().is_none());
    }

    #[test]
    fn test_json_sink_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.json");
        let sink = JsonSink::file(&path);

        let frame = sample_frame();
        sink.publish(&frame).unwrap();
        sink.publish(&frame).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["current"]["icon"]["asset"], "weather/light-rain");
        assert_eq!(json["header"]["time"]["text"], "15:30:00");
        assert!(!path.with_extension("partial").exists());
    }

    #[test]
    fn test_json_sink_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonSink::file(dir.path().join("missing").join("frame.json"));

        assert!(sink.publish(&sample_frame()).is_err());
    }
}
