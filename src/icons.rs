//! Mapping of weather data onto the icon assets of the display.
//!
//! Condition codes follow the OpenWeatherMap scheme
//! (<https://openweathermap.org/weather-conditions>).

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

/// Length of the synodic month in days.
pub const LUNAR_MONTH: f64 = 29.530588853;

/// Number of moon phase images shipped with the display assets.
pub const MOON_PHASE_IMAGES: usize = 24;

/// Number of named moon phases (new, waxing crescent, ... waning crescent).
pub const NAMED_MOON_PHASES: usize = 8;

/// Sky condition family of an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconCategory {
    Thunderstorm,
    Drizzle,
    LightRain,
    ExtremeRain,
    Rain,
    Sleet,
    Snow,
    Fog,
    Clear,
    PartlyCloudy,
    Cloudy,
    Unknown,
}

impl IconCategory {
    /// Whether the asset set has a dedicated night image for this category.
    pub fn has_night_variant(&self) -> bool {
        matches!(self, IconCategory::Clear | IconCategory::PartlyCloudy)
    }
}

/// Icon selection for one condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WeatherIcon {
    pub category: IconCategory,
    pub night: bool,
}

impl WeatherIcon {
    /// Map a condition code to an icon. `night` only affects the 8xx group.
    pub fn for_condition(code: i32, night: bool) -> Self {
        let category = match code {
            200..=299 => IconCategory::Thunderstorm,
            300..=399 => IconCategory::Drizzle,
            500 => IconCategory::LightRain,
            504 => IconCategory::ExtremeRain,
            511 => IconCategory::Sleet,
            501..=599 => IconCategory::Rain,
            611..=616 => IconCategory::Sleet,
            600..=699 => IconCategory::Snow,
            700..=799 => IconCategory::Fog,
            800 => IconCategory::Clear,
            801..=803 if !night => IconCategory::PartlyCloudy,
            801 => IconCategory::PartlyCloudy,
            802..=899 => IconCategory::Cloudy,
            _ => IconCategory::Unknown,
        };
        let night = night && (800..=899).contains(&code);

        Self { category, night }
    }

    /// Decode the legacy encoding where night conditions are shifted by
    /// 1000 (1800-1899).
    pub fn from_encoded(code: i32) -> Self {
        if (1800..=1899).contains(&code) {
            Self::for_condition(code - 1000, true)
        } else {
            Self::for_condition(code, false)
        }
    }

    /// File stem of the bitmap asset for this icon.
    pub fn asset_name(&self) -> &'static str {
        match (self.category, self.night && self.category.has_night_variant()) {
            (IconCategory::Thunderstorm, _) => "thunderstorm",
            (IconCategory::Drizzle, _) => "drizzle",
            (IconCategory::LightRain, _) => "light-rain",
            (IconCategory::ExtremeRain, _) => "extreme-rain",
            (IconCategory::Rain, _) => "rain",
            (IconCategory::Sleet, _) => "sleet",
            (IconCategory::Snow, _) => "snow",
            (IconCategory::Fog, _) => "fog",
            (IconCategory::Clear, false) => "clear-day",
            (IconCategory::Clear, true) => "clear-night",
            (IconCategory::PartlyCloudy, false) => "partly-cloudy-day",
            (IconCategory::PartlyCloudy, true) => "partly-cloudy-night",
            (IconCategory::Cloudy, _) => "cloudy",
            (IconCategory::Unknown, _) => "unknown",
        }
    }
}

/// Whether an observation falls outside daylight.
pub fn is_night(
    observation: DateTime<Utc>,
    sunrise: DateTime<Utc>,
    sunset: DateTime<Utc>,
) -> bool {
    observation < sunrise || observation > sunset
}

/// Map a lunar age in days onto one of `phases` evenly spaced images.
///
/// An age equal to a full lunar month lands on the last image, never on
/// `phases`.
pub fn moon_phase_index(age_days: f64, phases: usize) -> usize {
    if phases == 0 || !age_days.is_finite() || age_days <= 0.0 {
        return 0;
    }
    let index = (age_days * phases as f64 / LUNAR_MONTH).round() as usize;
    index.min(phases - 1)
}

/// Index into the eight named phases, 0 being new moon and 4 full moon.
///
/// Ages beyond a lunar month are clamped like in [`moon_phase_index`], so
/// the name always matches the image.
pub fn moon_phase_name_index(age_days: f64) -> usize {
    if !age_days.is_finite() || age_days <= 0.0 {
        return 0;
    }
    let fraction = age_days.min(LUNAR_MONTH) / LUNAR_MONTH;
    // the bucket after waning crescent wraps around to the next new moon
    ((fraction * NAMED_MOON_PHASES as f64 + 0.5).floor() as usize) % NAMED_MOON_PHASES
}

/// Approximate lunar age (days since the last new moon) at the given time.
pub fn moon_age_days(at: DateTime<Utc>) -> f64 {
    let reference = Utc
        .with_ymd_and_hms(2000, 1, 6, 18, 14, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let elapsed_days = (at - reference).num_seconds() as f64 / 86_400.0;
    elapsed_days.rem_euclid(LUNAR_MONTH)
}

/// Illuminated fraction of the lunar disc (0 at new moon, 1 at full moon).
pub fn moon_illumination(age_days: f64) -> f64 {
    if !age_days.is_finite() {
        return 0.0;
    }
    (1.0 - (std::f64::consts::TAU * age_days / LUNAR_MONTH).cos()) / 2.0
}

/// 8-point compass index (0 = N, 2 = E, ...) for a wind direction in degrees.
pub fn wind_direction_index(deg: i32) -> usize {
    let deg = deg.rem_euclid(360);
    (((deg * 8 + 180) / 360) % 8) as usize
}
