use crate::buffer::PriceRange;
use crate::config::Margin;
use feed::Candle;

use iced_core::Size;

/// Share of the chart width given to candle columns
pub const PLOT_WIDTH_RATIO: f64 = 0.8;

/// Narrowest column that still leaves the wick strictly inside the body
pub const MIN_COLUMN_WIDTH: u32 = 3;

/// Fixed pixel layout of the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartGeometry {
    pub size: Size<u32>,
    pub margin: Margin,
    pub column_width: u32,
}

impl ChartGeometry {
    pub fn new(size: Size<u32>, margin: Margin, column_width: u32) -> Self {
        Self {
            size,
            margin,
            column_width,
        }
    }

    /// Number of candle columns that fit, `floor(width * 0.8 / column_width)`.
    pub fn cols(&self) -> usize {
        if self.column_width == 0 {
            return 0;
        }

        (f64::from(self.size.width) * PLOT_WIDTH_RATIO / f64::from(self.column_width)).floor()
            as usize
    }

    pub fn plot_top(&self) -> i32 {
        self.margin.y
    }

    pub fn plot_bottom(&self) -> i32 {
        self.size.height as i32 - self.margin.y
    }
}

/// Horizontal extent of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XCoords {
    pub start: i32,
    pub center: i32,
    pub end: i32,
}

/// Pixel-space shape of one candle.
///
/// `y_body_start` maps the lower body price and `y_body_end` the upper one,
/// so on screen `y_body_start >= y_body_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x_start: i32,
    pub x_center: i32,
    pub x_end: i32,
    pub y_body_start: i32,
    pub y_body_end: i32,
    pub y_wick_high: i32,
    pub y_wick_low: i32,
}

/// Converts slot indices and prices into pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    geometry: ChartGeometry,
}

impl CoordinateMapper {
    pub fn new(geometry: ChartGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &ChartGeometry {
        &self.geometry
    }

    pub fn x_coords(&self, index: usize) -> XCoords {
        let width = self.geometry.column_width as i32;
        let start = self.geometry.margin.x + index as i32 * width;

        XCoords {
            start,
            // +1 nudges the wick onto the visual middle of the body
            center: start + width / 2 + 1,
            end: start + width,
        }
    }

    /// Higher prices map to smaller `y`. A flat range is stretched to one
    /// price unit, see [`PriceRange::span`].
    ///
    /// The result always lies in `[plot_top, plot_bottom]`, even for ranges
    /// too wide to represent.
    pub fn y_coord(&self, price: f64, range: &PriceRange) -> i32 {
        let top = self.geometry.plot_top();
        let bottom = self.geometry.plot_bottom();
        let height = f64::from(bottom - top).max(0.0);

        let offset = (price - range.min) / range.span() * height;
        let offset = if offset.is_nan() {
            0.0
        } else {
            offset.clamp(0.0, height)
        };

        bottom - offset.round() as i32
    }

    pub fn geometry_for(&self, index: usize, candle: &Candle, range: &PriceRange) -> Geometry {
        let x = self.x_coords(index);
        let (body_low, body_high) = candle.body();

        Geometry {
            x_start: x.start,
            x_center: x.center,
            x_end: x.end,
            y_body_start: self.y_coord(body_low, range),
            y_body_end: self.y_coord(body_high, range),
            y_wick_high: self.y_coord(candle.high(), range),
            y_wick_low: self.y_coord(candle.low(), range),
        }
    }
}
