//! Adaptive layout of charts, day columns and panels for a given screen.
//!
//! Everything here is a pure function of its inputs: no layout state survives
//! between calls, so every refresh starts from the raw numbers again.

use serde::Serialize;
use tracing::debug;

/// Horizontal inset of separator lines.
const SEPARATOR_PADDING: i32 = 10;

/// Height of the date/time header at the top of the screen.
pub const HEADER_HEIGHT: i32 = 90;

/// Height of the near-term temperature chart.
pub const NEAR_TERM_CHART_HEIGHT: i32 = 50;

/// Half the width of the moon phase image.
const MOON_ICON_HALF: i32 = 37;

/// Panels narrower than this use the compact current-weather arrangement.
const WIDE_PANEL_MIN_WIDTH: i32 = 300;

/// A pixel position on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A straight line between two points (separators, chart segments).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Line {
    pub from: Point,
    pub to: Point,
}

/// Rectangular target area handed in by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrawRegion {
    pub top: i32,
    pub left: i32,
    pub right: i32,
    pub height: i32,
}

impl DrawRegion {
    pub const fn new(top: i32, left: i32, right: i32, height: i32) -> Self {
        Self {
            top,
            left,
            right,
            height,
        }
    }

    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn center_x(&self) -> i32 {
        self.left + self.width() / 2
    }
}

// ==================== Series Layout ====================

/// One laid out data point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutSlot {
    pub x: i32,
    pub y: i32,
    /// Height of the point above the baseline in pixels
    pub scaled_value: f64,
}

/// Insets used when laying out a series inside a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartStyle {
    /// Horizontal padding on both sides
    pub padding: i32,
    /// Vertical pixels not used by the value range
    pub headroom: i32,
    /// Distance of the minimum value above the region bottom
    pub baseline: i32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            padding: 10,
            headroom: 11,
            baseline: 1,
        }
    }
}

impl ChartStyle {
    /// No horizontal padding, and the same vertical margin at top and bottom.
    pub const fn flush(margin: i32) -> Self {
        Self {
            padding: 0,
            headroom: margin,
            baseline: margin,
        }
    }
}

/// Result of [`layout_series`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesLayout {
    pub slots: Vec<LayoutSlot>,
    pub slot_count: usize,
    pub pixels_per_unit: f64,
    pub dist_x: f64,
    pub min_value: f64,
    pub max_value: f64,
}

impl SeriesLayout {
    fn empty() -> Self {
        Self {
            slots: Vec::new(),
            slot_count: 0,
            pixels_per_unit: 1.0,
            dist_x: 0.0,
            min_value: 0.0,
            max_value: 0.0,
        }
    }

    /// Closed polygon below the series line, down to `bottom`.
    pub fn area_polygon(&self, bottom: i32) -> Vec<Point> {
        let (Some(first), Some(last)) = (self.slots.first(), self.slots.last()) else {
            return Vec::new();
        };

        let mut polygon = Vec::with_capacity(self.slots.len() + 2);
        polygon.push(Point::new(first.x, bottom));
        polygon.extend(self.slots.iter().map(|s| Point::new(s.x, s.y)));
        polygon.push(Point::new(last.x, bottom));
        polygon
    }

    /// Line segments connecting consecutive slots.
    pub fn line_segments(&self) -> Vec<Line> {
        self.slots
            .windows(2)
            .map(|pair| Line {
                from: Point::new(pair[0].x, pair[0].y),
                to: Point::new(pair[1].x, pair[1].y),
            })
            .collect()
    }
}

/// Positive pixel width from a configured minimum; oversized values saturate.
fn pixel_width(min_width: u32) -> i32 {
    i32::try_from(min_width.max(1)).unwrap_or(i32::MAX)
}

/// Lay out a value series as evenly spaced points inside `region`.
///
/// The number of slots is limited by how many `min_slot_pixel_width` wide
/// slots fit, by the number of values and by `max_slots`. Values are scaled
/// so the smallest sits `style.baseline` above the region bottom and the
/// range spans `height - style.headroom` pixels. A flat series uses a unit
/// scale.
pub fn layout_series(
    region: &DrawRegion,
    values: &[f64],
    min_slot_pixel_width: u32,
    max_slots: usize,
    style: &ChartStyle,
) -> SeriesLayout {
    let usable = (region.width() - 2 * style.padding).max(0);
    let slot_width = pixel_width(min_slot_pixel_width);
    let fit = ((usable / slot_width) as usize).max(1);
    let slot_count = fit.min(values.len()).min(max_slots);

    if slot_count == 0 {
        return SeriesLayout::empty();
    }

    let values = &values[..slot_count];
    let min_value = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max_value = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let left = region.left + style.padding;
    let bottom = region.bottom();

    if slot_count == 1 {
        debug!(usable, "Single slot series, centering");
        return SeriesLayout {
            slots: vec![LayoutSlot {
                x: left + usable / 2,
                y: bottom - style.baseline,
                scaled_value: 0.0,
            }],
            slot_count,
            pixels_per_unit: 1.0,
            dist_x: 0.0,
            min_value,
            max_value,
        };
    }

    let dist_x = usable as f64 / (slot_count - 1) as f64;
    let range = max_value - min_value;
    let pixels_per_unit = if range > 0.0 {
        (region.height - style.headroom).max(1) as f64 / range
    } else {
        1.0
    };

    let slots = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let scaled_value = (value - min_value) * pixels_per_unit;
            LayoutSlot {
                x: left + (i as f64 * dist_x).round() as i32,
                y: bottom - scaled_value.round() as i32 - style.baseline,
                scaled_value,
            }
        })
        .collect();

    debug!(slot_count, dist_x, pixels_per_unit, "Laid out series");

    SeriesLayout {
        slots,
        slot_count,
        pixels_per_unit,
        dist_x,
        min_value,
        max_value,
    }
}

// ==================== Column Layout ====================

/// Evenly divided columns, e.g. one per forecast day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnLayout {
    pub count: usize,
    pub column_width: i32,
    pub centers: Vec<i32>,
}

/// Split `region` into as many columns of at least `min_column_width` as
/// there are items, up to `max_columns`.
pub fn layout_columns(
    region: &DrawRegion,
    available: usize,
    min_column_width: u32,
    max_columns: usize,
) -> ColumnLayout {
    let width = region.width();
    let fit = (width / pixel_width(min_column_width)) as usize;
    let count = fit.min(available).min(max_columns);

    if count == 0 {
        return ColumnLayout {
            count: 0,
            column_width: 0,
            centers: Vec::new(),
        };
    }

    let half = width / (2 * count as i32);
    let centers = (0..count as i32)
        .map(|i| region.left + half * (i * 2 + 1))
        .collect();

    ColumnLayout {
        count,
        column_width: half * 2,
        centers,
    }
}

// ==================== Screen Layout ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn for_display(width: i32, height: i32) -> Self {
        if width < height {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }
}

/// Panel regions of the whole screen for one orientation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenLayout {
    pub orientation: Orientation,
    pub width: i32,
    pub height: i32,
    pub header: DrawRegion,
    pub current: DrawRegion,
    /// Only landscape screens have room for the near-term chart
    pub near_term: Option<DrawRegion>,
    pub days: DrawRegion,
    pub astro: DrawRegion,
    pub separators: Vec<Line>,
}

fn horizontal_separator(left: i32, width: i32, y: i32) -> Line {
    Line {
        from: Point::new(left + SEPARATOR_PADDING, y),
        to: Point::new(left + width - SEPARATOR_PADDING, y),
    }
}

fn vertical_separator(x: i32, top: i32, height: i32) -> Line {
    Line {
        from: Point::new(x, top + SEPARATOR_PADDING),
        to: Point::new(x, top + height - SEPARATOR_PADDING),
    }
}

impl ScreenLayout {
    pub fn for_display(width: i32, height: i32) -> Self {
        let orientation = Orientation::for_display(width, height);
        let header = DrawRegion::new(0, 0, width, HEADER_HEIGHT);

        match orientation {
            Orientation::Portrait => Self {
                orientation,
                width,
                height,
                header,
                current: DrawRegion::new(90, 0, width, 140),
                near_term: None,
                days: DrawRegion::new(230, 0, width, 125),
                astro: DrawRegion::new(360, 0, width, (height - 360).max(0)),
                separators: vec![
                    horizontal_separator(0, width, 90),
                    horizontal_separator(0, width, 230),
                    horizontal_separator(0, width, 355),
                ],
            },
            Orientation::Landscape => {
                let center = width / 2;
                Self {
                    orientation,
                    width,
                    height,
                    header,
                    current: DrawRegion::new(90, 0, center, 150),
                    near_term: Some(DrawRegion::new(240, 0, center, NEAR_TERM_CHART_HEIGHT)),
                    days: DrawRegion::new(90, center, width, 120),
                    astro: DrawRegion::new(220, center, width, (height - 220).max(0)),
                    separators: vec![
                        horizontal_separator(0, width, 90),
                        vertical_separator(center, 90, height - 90),
                        horizontal_separator(center, center, 210),
                    ],
                }
            }
        }
    }
}

// ==================== Panel Layouts ====================

/// Anchor points of the current-weather panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrentWeatherLayout {
    pub wide: bool,
    pub icon: Point,
    pub description: Point,
    pub temperature: Point,
    pub humidity: Point,
    pub pressure: Option<Point>,
    pub wind_icon: Option<Point>,
    pub wind_text: Point,
}

impl CurrentWeatherLayout {
    pub fn for_region(region: &DrawRegion) -> Self {
        let top = region.top;
        let center = region.center_x();
        let icon = Point::new(region.left + 5, top + 35);
        let description = Point::new(center, top + 5);

        if region.width() >= WIDE_PANEL_MIN_WIDTH {
            Self {
                wide: true,
                icon,
                description,
                // shifted right to balance the degree sign
                temperature: Point::new(center + 10, top + 30),
                humidity: Point::new(center, top + 88),
                pressure: Some(Point::new(center, top + 110)),
                wind_icon: Some(Point::new(region.right - 80, top + 35)),
                wind_text: Point::new(region.right - 43, top + 110),
            }
        } else {
            let ruler = region.right - 75;
            Self {
                wide: false,
                icon,
                description,
                temperature: Point::new(ruler + 10, top + 30),
                humidity: Point::new(ruler, top + 88),
                pressure: None,
                wind_icon: None,
                wind_text: Point::new(ruler, top + 110),
            }
        }
    }
}

/// Anchor points of the sun/moon panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AstroLayout {
    pub sun_center: i32,
    pub moon_center: i32,
    pub caption_y: i32,
    pub rise_y: i32,
    pub set_y: i32,
    pub moon_icon: Point,
    pub phase_name: Option<Point>,
}

impl AstroLayout {
    pub fn for_region(region: &DrawRegion, orientation: Orientation) -> Self {
        let width = region.width();
        let offset = (width / 2 - MOON_ICON_HALF) / 2;
        let center = region.center_x();

        Self {
            sun_center: region.left + offset,
            moon_center: region.left + width - offset,
            caption_y: region.top + 5,
            rise_y: region.top + 40,
            set_y: region.top + 65,
            moon_icon: Point::new(center - MOON_ICON_HALF, region.top + 10),
            phase_name: (orientation == Orientation::Portrait)
                .then(|| Point::new(center, region.top + 95)),
        }
    }
}
