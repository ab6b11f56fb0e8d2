//! Integration tests for the refresh pipeline using mock dependencies.
//!
//! These tests drive aggregation, layout and frame composition through the
//! public API with MockClock and MockSink for deterministic results.

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, NaiveDate, TimeZone, Utc};
use weather_station::{
    AggregateOptions, AppConfig, ChartStyle, CurrentConditions, DrawRegion, ForecastSample,
    MockClock, MockSink, Orientation, SnapshotSource, WeatherSnapshot, aggregate_in,
    api::{ForecastResponse, SampleFilter},
    build_frame, layout_columns, layout_series, refresh_once,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn cest() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).unwrap()
}

/// Local (UTC+2) time on June 2024.
fn local(day: u32, hour: u32) -> DateTime<Utc> {
    cest()
        .with_ymd_and_hms(2024, 6, day, hour, 0, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn sample(time: DateTime<Utc>, temp: f64, condition_code: i32) -> ForecastSample {
    ForecastSample {
        observation_time: time,
        temp,
        condition_code,
        wind_speed: 2.0,
        wind_deg: 180,
    }
}

fn current(time: DateTime<Utc>) -> CurrentConditions {
    CurrentConditions {
        observation_time: time,
        temp: 17.0,
        feels_like: 16.0,
        condition_code: 800,
        description: "clear sky".to_string(),
        humidity: 40,
        pressure: 1020,
        wind_speed: 1.5,
        wind_deg: 315,
        sunrise: local(17, 5),
        sunset: local(17, 21),
        city_name: "Zurich".to_string(),
        lat: 47.37,
        lon: 8.54,
    }
}

// ==================== Aggregation Scenarios ====================

/// Mon 09:00 10°/801, Mon 14:00 18°/800, Tue 10:00 5°/600, two days.
#[test]
fn test_two_day_reference_scenario() {
    let samples = vec![
        sample(local(17, 9), 10.0, 801),
        sample(local(17, 14), 18.0, 800),
        sample(local(18, 10), 5.0, 600),
    ];

    let days = aggregate_in(&samples, &cest(), &AggregateOptions::with_max_days(2));

    assert_eq!(days.len(), 2);
    assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 17).unwrap());
    assert_eq!(days[0].day_index, 1);
    assert_eq!((days[0].min_temp, days[0].max_temp), (10.0, 18.0));
    assert_eq!(days[0].condition_code, 800);
    assert_eq!(days[0].condition_hour, 14);

    assert_eq!(days[1].day_index, 2);
    assert_eq!((days[1].min_temp, days[1].max_temp), (5.0, 5.0));
    assert_eq!(days[1].condition_code, 600);
}

/// A 3-hourly five day forecast yields ordered, bounded days.
#[test]
fn test_full_forecast_aggregation() {
    let start = local(17, 2);
    let samples: Vec<_> = (0..40)
        .map(|i| sample(start + ChronoDuration::hours(3 * i), (i % 8) as f64, 800))
        .collect();

    let days = aggregate_in(&samples, &cest(), &AggregateOptions::with_max_days(5));

    assert_eq!(days.len(), 5);
    assert!(days.windows(2).all(|w| w[0].date < w[1].date));
    assert!(days.iter().all(|d| d.min_temp <= d.max_temp));
    // every full day sees the whole 0..7 cycle
    assert_eq!((days[1].min_temp, days[1].max_temp), (0.0, 7.0));
    assert_eq!(days[1].condition_hour, 11);
}

/// Provider forecast with 40 three-hourly entries from 2024-06-17 00:00 UTC,
/// kept to the given UTC hours.
fn filtered_forecast(allowed_hours: Vec<u32>) -> Vec<ForecastSample> {
    let midnight = Utc.with_ymd_and_hms(2024, 6, 17, 0, 0, 0).unwrap().timestamp();
    let entries: Vec<String> = (0..40)
        .map(|i| {
            format!(
                r#"{{"dt": {}, "main": {{"temp": {}}}, "weather": [{{"id": 800}}]}}"#,
                midnight + i * 3 * 3600,
                10.0 + i as f64
            )
        })
        .collect();
    let response: ForecastResponse =
        serde_json::from_str(&format!(r#"{{"list": [{}]}}"#, entries.join(","))).unwrap();

    SampleFilter {
        allowed_hours,
        max_samples: 40,
    }
    .apply(response.list)
}

/// Twice-daily samples are 12 h apart and still form one summary per date.
#[test]
fn test_twice_daily_forecast_one_summary_per_date() {
    let samples = filtered_forecast(vec![0, 12]);
    assert_eq!(samples.len(), 10);

    let mut config = AppConfig::default();
    config.provider.allowed_hours = vec![0, 12];
    let yesterday = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap();
    let options = config
        .forecast
        .aggregate_options(yesterday, &config.provider.allowed_hours);

    let days = aggregate_in(&samples, &cest(), &options);

    assert_eq!(days.len(), 5);
    assert!(days.windows(2).all(|w| w[0].date < w[1].date));
    assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 17).unwrap());
    // 02:00 and 14:00 local land in the same day
    assert_eq!((days[0].min_temp, days[0].max_temp), (10.0, 14.0));
    assert_eq!(days[0].condition_hour, 14);
}

/// The day panel of a twice-daily forecast shows each weekday once.
#[test]
fn test_twice_daily_forecast_frame_weekdays_are_distinct() {
    let now = local(17, 10);
    let snapshot = WeatherSnapshot {
        current: current(now),
        samples: filtered_forecast(vec![0, 12]),
    };
    let mut config = AppConfig::default();
    config.provider.allowed_hours = vec![0, 12];

    let frame = build_frame(&snapshot, &config, &MockClock::new(now), &cest());

    assert!(!frame.days.is_empty());
    assert_eq!(frame.days[0].weekday.text, "TUE");
    assert!(
        frame
            .days
            .windows(2)
            .all(|w| w[0].summary.date < w[1].summary.date)
    );
}

// ==================== Layout Scenarios ====================

/// Values [10, 20, 15] in a 300 px region with 50 px slots and a cap of 5.
#[test]
fn test_series_reference_scenario() {
    let region = DrawRegion::new(0, 0, 300, 60);
    let layout = layout_series(&region, &[10.0, 20.0, 15.0], 50, 5, &ChartStyle::flush(0));

    assert_eq!(layout.slot_count, 3);
    assert_eq!(layout.dist_x, 150.0);
    let xs: Vec<_> = layout.slots.iter().map(|s| s.x).collect();
    assert_eq!(xs, vec![0, 150, 300]);
}

#[test]
fn test_series_flat_values() {
    let region = DrawRegion::new(100, 0, 320, 50);
    let layout = layout_series(&region, &[7.0; 6], 35, 12, &ChartStyle::default());

    assert_eq!(layout.pixels_per_unit, 1.0);
    assert!(layout.slots.iter().all(|s| s.y == layout.slots[0].y));
}

#[test]
fn test_columns_for_day_panel() {
    let region = DrawRegion::new(230, 0, 320, 125);
    let columns = layout_columns(&region, 5, 70, 5);

    assert_eq!(columns.count, 4);
    assert_eq!(columns.centers, vec![40, 120, 200, 280]);
}

// ==================== Refresh Pipeline ====================

#[tokio::test]
async fn test_refresh_from_snapshot_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    let now = local(17, 10);
    let samples = (0..16)
        .map(|i| sample(now + ChronoDuration::hours(3 * i), 15.0 + i as f64, 801))
        .collect();
    WeatherSnapshot {
        current: current(now),
        samples,
    }
    .save(&path)
    .unwrap();

    let mut config = AppConfig::default();
    config.display.width = 480;
    config.display.height = 320;

    let sink = MockSink::new();
    let clock = MockClock::new(now);

    let frame = refresh_once(
        &SnapshotSource::File(path),
        &config,
        &clock,
        &cest(),
        &sink,
        None,
    )
    .await
    .expect("Refresh should succeed");

    assert_eq!(sink.frame_count(), 1);
    assert_eq!(frame.orientation, Orientation::Landscape);
    assert_eq!(frame.current.icon.asset, "weather/clear-day");
    // today is skipped, the remaining 16 samples reach into Wednesday
    let weekdays: Vec<_> = frame.days.iter().map(|d| d.weekday.text.as_str()).collect();
    assert_eq!(weekdays, vec!["TUE", "WED"]);
    assert!(frame.near_term.is_some());
}

#[tokio::test]
async fn test_refresh_from_provider() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "coord": {"lon": 8.54, "lat": 47.37},
                "weather": [{"id": 800, "description": "clear sky"}],
                "main": {"temp": 3.0, "feels_like": 1.0, "pressure": 1030, "humidity": 70},
                "wind": {"speed": 1.0, "deg": 0},
                "dt": 1718665200,
                "sys": {"sunrise": 1718593200, "sunset": 1718652600},
                "name": "Zurich"
            }"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"list": []}"#))
        .mount(&mock_server)
        .await;

    let mut config = AppConfig::default();
    config.provider.api_url = mock_server.uri();
    config.provider.api_key = "test-key".to_string();

    let source = SnapshotSource::from_config(&config, None).unwrap();
    let sink = MockSink::new();
    // 2024-06-17 23:00 UTC, after sunset
    let clock = MockClock::new(Utc.timestamp_opt(1_718_665_200, 0).unwrap());

    let frame = refresh_once(&source, &config, &clock, &Utc, &sink, None)
        .await
        .unwrap();

    assert_eq!(frame.current.icon.asset, "weather/clear-night");
    assert!(frame.days.is_empty());
    assert_eq!(sink.last_frame(), Some(frame));
}

#[tokio::test]
async fn test_failed_refresh_publishes_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let mut config = AppConfig::default();
    config.provider.api_url = mock_server.uri();
    config.provider.api_key = "test-key".to_string();

    let source = SnapshotSource::from_config(&config, None).unwrap();
    let sink = MockSink::new();
    let clock = MockClock::new(Utc::now());

    let result = refresh_once(&source, &config, &clock, &Utc, &sink, None).await;

    assert!(result.is_err());
    assert!(!sink.was_called());
}

#[tokio::test]
async fn test_consecutive_refreshes_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    let now = local(17, 10);

    WeatherSnapshot {
        current: current(now),
        samples: vec![sample(local(18, 12), 20.0, 500)],
    }
    .save(&path)
    .unwrap();

    let config = AppConfig::default();
    let source = SnapshotSource::File(path.clone());
    let sink = MockSink::new();
    let clock = MockClock::new(now);

    refresh_once(&source, &config, &clock, &cest(), &sink, None)
        .await
        .unwrap();

    // the next cycle sees different data and must not carry anything over
    WeatherSnapshot {
        current: current(now),
        samples: Vec::new(),
    }
    .save(&path)
    .unwrap();
    clock.advance(ChronoDuration::minutes(10));

    refresh_once(&source, &config, &clock, &cest(), &sink, None)
        .await
        .unwrap();

    let frames = sink.frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].days.len(), 1);
    assert_eq!(frames[0].days[0].range.text, "20°");
    assert!(frames[1].days.is_empty());
    assert_eq!(frames[1].header.time.text, "10:10:00");
}
