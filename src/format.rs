//! Text labels for the renderer.
//!
//! Aggregation and layout work in °C and m/s only; conversion to the display
//! unit happens here, right before values become strings.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

/// Display unit system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    Imperial,
}

impl Units {
    pub fn from_metric_flag(is_metric: bool) -> Self {
        if is_metric {
            Units::Metric
        } else {
            Units::Imperial
        }
    }

    /// Convert a canonical °C value into the display unit.
    pub fn temperature(&self, celsius: f64) -> f64 {
        match self {
            Units::Metric => celsius,
            Units::Imperial => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    /// Convert a canonical m/s value into km/h or mph.
    pub fn wind_speed(&self, meters_per_second: f64) -> f64 {
        match self {
            Units::Metric => meters_per_second * 3.6,
            Units::Imperial => meters_per_second * 2.236_936,
        }
    }

    pub fn wind_speed_unit(&self) -> &'static str {
        match self {
            Units::Metric => "km/h",
            Units::Imperial => "mph",
        }
    }
}

/// Whole-number rendering without a "-0".
fn whole(value: f64) -> String {
    let rounded = value.round();
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{:.0}", rounded)
    }
}

/// Temperature with a degree sign, e.g. `21.4°` or `21,4°`.
pub fn temperature_label(celsius: f64, units: Units, decimals: usize, decimal_comma: bool) -> String {
    let value = units.temperature(celsius);
    let text = if decimals == 0 {
        whole(value)
    } else {
        format!("{:.*}", decimals, value)
    };
    let text = if decimal_comma {
        text.replace('.', ",")
    } else {
        text
    };
    format!("{}°", text)
}

/// Day range such as `5-18°`, collapsed to `5°` when both ends round equal.
pub fn range_label(min_celsius: f64, max_celsius: f64, units: Units) -> String {
    let min = whole(units.temperature(min_celsius));
    let max = whole(units.temperature(max_celsius));
    if min == max {
        format!("{}°", min)
    } else {
        format!("{}-{}°", min, max)
    }
}

pub fn wind_speed_label(meters_per_second: f64, units: Units) -> String {
    format!(
        "{} {}",
        whole(units.wind_speed(meters_per_second)),
        units.wind_speed_unit()
    )
}

pub fn humidity_label(humidity: u8) -> String {
    format!("{} %", humidity)
}

pub fn pressure_label(pressure: u16) -> String {
    format!("{} hPa", pressure)
}

/// Local wall-clock time as `HH:MM`.
pub fn time_label<Tz>(time: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.with_timezone(tz).format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    #[test]
    fn test_units_conversion() {
        assert_eq!(Units::Metric.temperature(21.5), 21.5);
        assert_eq!(Units::Imperial.temperature(100.0), 212.0);
        assert_eq!(Units::Imperial.temperature(-40.0), -40.0);
        assert!((Units::Metric.wind_speed(10.0) - 36.0).abs() < 1e-9);
        assert!((Units::Imperial.wind_speed(10.0) - 22.36936).abs() < 1e-6);
    }

    #[test]
    fn test_units_from_flag() {
        assert_eq!(Units::from_metric_flag(true), Units::Metric);
        assert_eq!(Units::from_metric_flag(false), Units::Imperial);
    }

    #[test]
    fn test_temperature_label() {
        assert_eq!(temperature_label(21.44, Units::Metric, 1, false), "21.4°");
        assert_eq!(temperature_label(21.44, Units::Metric, 1, true), "21,4°");
        assert_eq!(temperature_label(20.0, Units::Imperial, 0, false), "68°");
        assert_eq!(temperature_label(-0.3, Units::Metric, 0, false), "0°");
    }

    #[test]
    fn test_range_label() {
        assert_eq!(range_label(5.2, 18.4, Units::Metric), "5-18°");
        assert_eq!(range_label(5.2, 5.4, Units::Metric), "5°");
        assert_eq!(range_label(0.0, 10.0, Units::Imperial), "32-50°");
        assert_eq!(range_label(-0.4, 0.2, Units::Metric), "0°");
    }

    #[test]
    fn test_wind_speed_label() {
        assert_eq!(wind_speed_label(3.6, Units::Metric), "13 km/h");
        assert_eq!(wind_speed_label(3.6, Units::Imperial), "8 mph");
    }

    #[test]
    fn test_humidity_and_pressure_labels() {
        assert_eq!(humidity_label(54), "54 %");
        assert_eq!(pressure_label(1016), "1016 hPa");
    }

    #[test]
    fn test_time_label_uses_local_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let time = Utc.with_ymd_and_hms(2024, 6, 15, 22, 5, 0).unwrap();
        assert_eq!(time_label(time, &tz), "00:05");
        assert_eq!(time_label(time, &Utc), "22:05");
    }
}
