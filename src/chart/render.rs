use crate::window::{self, Backend, Point, Rect};
use data::{CandleBuffer, Geometry, Role, Theme};

use iced_core::Size;

/// A presented frame read back as packed RGBA, row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub size: Size<u32>,
    pub pixels: Vec<u8>,
}

/// Body rectangle of a candle, never thinner than one pixel
pub fn body_rect(geometry: &Geometry) -> Rect {
    let top = geometry.y_body_start.min(geometry.y_body_end);
    let height = geometry.y_body_start.abs_diff(geometry.y_body_end).max(1);

    Rect {
        x: geometry.x_start,
        y: top,
        width: geometry.x_end.saturating_sub(geometry.x_start).max(0) as u32,
        height,
    }
}

/// Clears the surface, draws every buffered candle oldest first, presents.
pub fn draw<B>(buffer: &CandleBuffer, theme: &Theme, surface: &mut B) -> Result<(), window::Error>
where
    B: Backend + ?Sized,
{
    surface.clear(theme[Role::Background])?;

    for (candle, geometry) in buffer.occupied() {
        let color = theme.candle(candle.direction());

        surface.fill_rect(body_rect(geometry), color)?;
        surface.draw_line(
            Point::new(geometry.x_center, geometry.y_wick_high),
            Point::new(geometry.x_center, geometry.y_wick_low),
            color,
        )?;
    }

    surface.present()
}

pub fn capture<B>(surface: &B) -> Result<Capture, window::Error>
where
    B: Backend + ?Sized,
{
    let size = surface.size();
    let pixels = surface.read_pixels()?;

    let expected = size.width as usize * size.height as usize * 4;
    if pixels.len() != expected {
        return Err(window::Error::ReadBack {
            expected,
            actual: pixels.len(),
        });
    }

    Ok(Capture { size, pixels })
}
