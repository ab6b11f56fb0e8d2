//! Weather Station Library
//!
//! Turns provider forecasts into ready-to-draw frames for a small weather
//! display: day aggregation, adaptive layout, icon selection and the
//! plumbing around them.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod format;
pub mod icons;
pub mod layout;
pub mod logging;
pub mod model;
pub mod refresh;
pub mod traits;

// Re-export commonly used types
pub use aggregate::{AggregateOptions, TieBreak, aggregate, aggregate_in};
pub use api::{OpenWeatherMapClient, ProviderError};
pub use config::AppConfig;
pub use dashboard::{Frame, build_frame};
pub use icons::{IconCategory, WeatherIcon};
pub use layout::{
    ChartStyle, ColumnLayout, DrawRegion, LayoutSlot, Orientation, ScreenLayout, SeriesLayout,
    layout_columns, layout_series,
};
pub use model::{CurrentConditions, DaySummary, ForecastSample, WeatherSnapshot};
pub use refresh::{SnapshotSource, refresh_once};
pub use traits::{Clock, FrameSink, JsonSink, MockClock, MockSink, SystemClock};
