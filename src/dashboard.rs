//! Composition of one refresh cycle into a frame of drawing primitives.
//!
//! The renderer on the other side only blits what it receives: every
//! position, asset name and text in a [`Frame`] is final.

use std::fmt::{Display, Write};

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    aggregate::aggregate_in,
    config::{AppConfig, LabelsConfig},
    format::{
        Units, humidity_label, pressure_label, range_label, temperature_label, time_label,
        wind_speed_label,
    },
    icons::{
        WeatherIcon, is_night, moon_age_days, moon_illumination, moon_phase_index,
        moon_phase_name_index, wind_direction_index,
    },
    layout::{
        AstroLayout, ChartStyle, CurrentWeatherLayout, DrawRegion, Line, Orientation, Point,
        ScreenLayout, SeriesLayout, layout_columns, layout_series,
    },
    model::{CurrentConditions, DaySummary, WeatherSnapshot},
    traits::Clock,
};

/// Wind rose image stems, north first, clockwise.
const WIND_ICON_NAMES: [&str; 8] = ["n", "ne", "e", "se", "s", "sw", "w", "nw"];

// Font sizes of the display's text styles.
const HEADER_DATE_SIZE: u8 = 16;
const HEADER_TIME_SIZE: u8 = 53;
const CAPTION_SIZE: u8 = 24;
const CURRENT_TEMP_SIZE: u8 = 48;
const BODY_SIZE: u8 = 18;
const CHART_SIZE: u8 = 12;
const PHASE_NAME_SIZE: u8 = 14;

/// Offset of a day column's small icon from the column center.
const SMALL_ICON_HALF: i32 = 25;

/// Height of the temperature label above its chart point.
const CHART_LABEL_RISE: i32 = 18;

// ==================== Frame Types ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    /// Text starts at the point
    Left,
    /// Text is horizontally centered on the point
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLabel {
    pub text: String,
    pub at: Point,
    pub anchor: Anchor,
    pub size: u8,
}

impl TextLabel {
    fn centered(text: impl Into<String>, at: Point, size: u8) -> Self {
        Self {
            text: text.into(),
            at,
            anchor: Anchor::Center,
            size,
        }
    }

    fn left(text: impl Into<String>, at: Point, size: u8) -> Self {
        Self {
            text: text.into(),
            at,
            anchor: Anchor::Left,
            size,
        }
    }
}

/// A bitmap to draw with its top-left corner at `at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IconPlacement {
    /// Asset path without extension, e.g. `weather/clear-night`
    pub asset: String,
    pub at: Point,
}

impl IconPlacement {
    fn new(set: &str, stem: &str, at: Point) -> Self {
        Self {
            asset: format!("{}/{}", set, stem),
            at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderPanel {
    pub region: DrawRegion,
    pub date: TextLabel,
    pub time: TextLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentPanel {
    pub region: DrawRegion,
    pub icon: IconPlacement,
    pub description: TextLabel,
    pub temperature: TextLabel,
    pub humidity: TextLabel,
    pub pressure: Option<TextLabel>,
    pub wind_icon: Option<IconPlacement>,
    pub wind: TextLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPanel {
    pub region: DrawRegion,
    pub series: SeriesLayout,
    pub area: Vec<Point>,
    pub segments: Vec<Line>,
    pub time_labels: Vec<TextLabel>,
    pub temperature_labels: Vec<TextLabel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayColumn {
    pub summary: DaySummary,
    pub center_x: i32,
    pub weekday: TextLabel,
    pub range: TextLabel,
    pub icon: IconPlacement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AstroPanel {
    pub region: DrawRegion,
    pub sun_caption: TextLabel,
    pub moon_caption: TextLabel,
    pub sunrise: TextLabel,
    pub sunset: TextLabel,
    pub illumination: TextLabel,
    pub moon_age: TextLabel,
    pub moon_icon: IconPlacement,
    pub moon_phase_index: usize,
    pub phase_name: Option<TextLabel>,
}

/// Everything the renderer needs for one screen update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub generated_at: DateTime<Utc>,
    pub orientation: Orientation,
    pub width: i32,
    pub height: i32,
    pub units: Units,
    pub header: HeaderPanel,
    pub current: CurrentPanel,
    pub near_term: Option<ChartPanel>,
    pub days: Vec<DayColumn>,
    pub astro: AstroPanel,
    pub separators: Vec<Line>,
}

// ==================== Frame Composition ====================

/// Build the frame for one refresh from a snapshot.
///
/// `tz` converts provider times into the display's wall clock; `clock`
/// decides what "now" is for the header, the moon and skipping today's
/// forecast.
pub fn build_frame<C, Tz>(
    snapshot: &WeatherSnapshot,
    config: &AppConfig,
    clock: &C,
    tz: &Tz,
) -> Frame
where
    C: Clock + ?Sized,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let now = clock.now_utc();
    let screen = ScreenLayout::for_display(config.display.width, config.display.height);
    let units = config.units.units();

    let header = header_panel(&screen.header, now, tz, &config.labels);
    let current = current_panel(&screen.current, &snapshot.current, config, units);
    let near_term = screen
        .near_term
        .map(|region| chart_panel(&region, snapshot, config, units, tz));
    let days = day_columns(&screen.days, snapshot, config, units, now, tz);
    let astro = astro_panel(&screen.astro, screen.orientation, &snapshot.current, config, now, tz);

    info!(
        orientation = ?screen.orientation,
        days = days.len(),
        chart_slots = near_term.as_ref().map_or(0, |c| c.series.slot_count),
        "Built frame"
    );

    Frame {
        generated_at: now,
        orientation: screen.orientation,
        width: screen.width,
        height: screen.height,
        units,
        header,
        current,
        near_term,
        days,
        astro,
        separators: screen.separators,
    }
}

/// Format with a user supplied strftime pattern, falling back to ISO 8601
/// when the pattern is invalid.
fn format_with<Tz>(time: &DateTime<Tz>, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    if write!(out, "{}", time.format(pattern)).is_err() {
        debug!(pattern, "Invalid time format, using ISO 8601");
        out.clear();
        out.push_str(&time.format("%Y-%m-%d %H:%M").to_string());
    }
    out
}

fn label(labels: &[String], index: usize) -> String {
    labels.get(index).cloned().unwrap_or_default()
}

fn header_panel<Tz>(
    region: &DrawRegion,
    now: DateTime<Utc>,
    tz: &Tz,
    labels: &LabelsConfig,
) -> HeaderPanel
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let local = now.with_timezone(tz);
    let weekday = label(
        &labels.weekdays,
        local.weekday().num_days_from_sunday() as usize,
    );
    let center = region.center_x();

    HeaderPanel {
        region: *region,
        date: TextLabel::centered(
            format!("{}, {}", weekday, format_with(&local, &labels.date_format)),
            Point::new(center, region.top + 5),
            HEADER_DATE_SIZE,
        ),
        time: TextLabel::centered(
            format_with(&local, &labels.time_format),
            Point::new(center, region.top + 20),
            HEADER_TIME_SIZE,
        ),
    }
}

fn current_panel(
    region: &DrawRegion,
    current: &CurrentConditions,
    config: &AppConfig,
    units: Units,
) -> CurrentPanel {
    let layout = CurrentWeatherLayout::for_region(region);
    let night = is_night(current.observation_time, current.sunrise, current.sunset);
    let icon = WeatherIcon::for_condition(current.condition_code, night);
    let direction = wind_direction_index(current.wind_deg);
    let speed = wind_speed_label(current.wind_speed, units);

    debug!(
        code = current.condition_code,
        night,
        asset = icon.asset_name(),
        wide = layout.wide,
        "Current weather icon"
    );

    let wind_text = if layout.wide {
        speed
    } else {
        format!("{}, {}", speed, label(&config.labels.wind_directions, direction))
    };

    CurrentPanel {
        region: *region,
        icon: IconPlacement::new("weather", icon.asset_name(), layout.icon),
        description: TextLabel::centered(&current.description, layout.description, CAPTION_SIZE),
        temperature: TextLabel::centered(
            temperature_label(current.temp, units, 1, config.units.decimal_comma),
            layout.temperature,
            CURRENT_TEMP_SIZE,
        ),
        humidity: TextLabel::centered(humidity_label(current.humidity), layout.humidity, BODY_SIZE),
        pressure: layout
            .pressure
            .map(|at| TextLabel::centered(pressure_label(current.pressure), at, BODY_SIZE)),
        wind_icon: layout
            .wind_icon
            .map(|at| IconPlacement::new("wind", WIND_ICON_NAMES[direction], at)),
        wind: TextLabel::centered(wind_text, layout.wind_text, BODY_SIZE),
    }
}

fn chart_panel<Tz>(
    region: &DrawRegion,
    snapshot: &WeatherSnapshot,
    config: &AppConfig,
    units: Units,
    tz: &Tz,
) -> ChartPanel
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let samples: Vec<_> = snapshot
        .samples
        .iter()
        .filter(|s| s.temp.is_finite())
        .collect();
    let values: Vec<f64> = samples.iter().map(|s| s.temp).collect();

    let series = layout_series(
        region,
        &values,
        config.chart.min_slot_pixel_width,
        config.chart.max_slots,
        &ChartStyle::default(),
    );

    // every slot but the last gets a label pair; the last one would run off
    // the right edge
    let labelled = series.slots.len().saturating_sub(1);
    let mut time_labels = Vec::with_capacity(labelled);
    let mut temperature_labels = Vec::with_capacity(labelled);
    for (slot, sample) in series.slots.iter().zip(&samples).take(labelled) {
        time_labels.push(TextLabel::left(
            time_label(sample.observation_time, tz),
            Point::new(slot.x, region.bottom() + 1),
            CHART_SIZE,
        ));
        temperature_labels.push(TextLabel::left(
            temperature_label(sample.temp, units, 0, config.units.decimal_comma),
            Point::new(slot.x, slot.y - CHART_LABEL_RISE),
            CHART_SIZE,
        ));
    }

    ChartPanel {
        region: *region,
        area: series.area_polygon(region.bottom()),
        segments: series.line_segments(),
        series,
        time_labels,
        temperature_labels,
    }
}

fn day_columns<Tz: TimeZone>(
    region: &DrawRegion,
    snapshot: &WeatherSnapshot,
    config: &AppConfig,
    units: Units,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Vec<DayColumn> {
    let today = now.with_timezone(tz).date_naive();
    let options = config
        .forecast
        .aggregate_options(today, &config.provider.allowed_hours);
    let summaries = aggregate_in(&snapshot.samples, tz, &options);
    let columns = layout_columns(
        region,
        summaries.len(),
        config.forecast.min_day_column_width,
        config.forecast.max_days,
    );

    summaries
        .into_iter()
        .zip(columns.centers)
        .map(|(summary, x)| {
            let icon = WeatherIcon::for_condition(summary.condition_code, false);
            DayColumn {
                center_x: x,
                weekday: TextLabel::centered(
                    label(&config.labels.weekdays_abbr, summary.day_index as usize),
                    Point::new(x, region.top + 5),
                    CAPTION_SIZE,
                ),
                range: TextLabel::centered(
                    range_label(summary.min_temp, summary.max_temp, units),
                    Point::new(x, region.top + 37),
                    BODY_SIZE,
                ),
                icon: IconPlacement::new(
                    "weather-small",
                    icon.asset_name(),
                    Point::new(x - SMALL_ICON_HALF, region.top + 65),
                ),
                summary,
            }
        })
        .collect()
}

fn astro_panel<Tz>(
    region: &DrawRegion,
    orientation: Orientation,
    current: &CurrentConditions,
    config: &AppConfig,
    now: DateTime<Utc>,
    tz: &Tz,
) -> AstroPanel
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let layout = AstroLayout::for_region(region, orientation);
    let labels = &config.labels;
    let age = moon_age_days(now);
    let phase_index = moon_phase_index(age, config.astro.moon_phase_images);
    let illumination = (moon_illumination(age) * 100.0).round();

    debug!(age, phase_index, illumination, "Moon phase");

    let sun = |y| Point::new(layout.sun_center, y);
    let moon = |y| Point::new(layout.moon_center, y);

    AstroPanel {
        region: *region,
        sun_caption: TextLabel::centered(label(&labels.sun_moon, 0), sun(layout.caption_y), CAPTION_SIZE),
        moon_caption: TextLabel::centered(label(&labels.sun_moon, 1), moon(layout.caption_y), CAPTION_SIZE),
        sunrise: TextLabel::centered(time_label(current.sunrise, tz), sun(layout.rise_y), BODY_SIZE),
        sunset: TextLabel::centered(time_label(current.sunset, tz), sun(layout.set_y), BODY_SIZE),
        illumination: TextLabel::centered(
            format!("{} %", illumination),
            moon(layout.rise_y),
            BODY_SIZE,
        ),
        moon_age: TextLabel::centered(format!("{:.1} d", age), moon(layout.set_y), BODY_SIZE),
        moon_icon: IconPlacement::new("moon", &format!("m-phase-{}", phase_index), layout.moon_icon),
        moon_phase_index: phase_index,
        phase_name: layout.phase_name.map(|at| {
            TextLabel::centered(
                label(&labels.moon_phases, moon_phase_name_index(age)),
                at,
                PHASE_NAME_SIZE,
            )
        }),
    }
}
