pub mod terminal;

use iced_core::{Color, Size};
use image::{Rgba, RgbaImage};
use tokio::sync::mpsc;

/// Keys the chart reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Return,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Quit,
    KeyDown(Key),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle; the extent is unsigned so it can never be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSettings {
    pub title: String,
    pub size: Size<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid window size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Window is closed")]
    Closed,
    #[error("No frame has been presented yet")]
    NothingPresented,
    #[error("Read back {actual} bytes, expected {expected}")]
    ReadBack { expected: usize, actual: usize },
}

/// Drawing surface plus input source of a chart window.
///
/// Draw calls go to a back buffer that only becomes visible on `present`.
/// `read_pixels` returns the last presented frame as packed RGBA.
pub trait Backend {
    fn size(&self) -> Size<u32>;

    fn clear(&mut self, color: Color) -> Result<(), Error>;

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), Error>;

    fn draw_line(&mut self, from: Point, to: Point, color: Color) -> Result<(), Error>;

    fn present(&mut self) -> Result<(), Error>;

    fn read_pixels(&self) -> Result<Vec<u8>, Error>;

    /// Drains pending input without waiting
    fn poll_events(&mut self) -> Vec<Event>;

    fn close(&mut self);
}

pub type EventSender = mpsc::UnboundedSender<Event>;
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Software rasterizer backed by an RGBA image.
#[derive(Debug)]
pub struct Framebuffer {
    title: String,
    back: RgbaImage,
    front: Option<RgbaImage>,
    events: EventReceiver,
    closed: bool,
    presented: u64,
}

impl Framebuffer {
    pub fn open(settings: &WindowSettings, events: EventReceiver) -> Result<Self, Error> {
        let Size { width, height } = settings.size;

        if width == 0 || height == 0 {
            return Err(Error::InvalidSize { width, height });
        }

        log::info!("Opened {width}x{height} chart window '{}'", settings.title);

        Ok(Self {
            title: settings.title.clone(),
            back: RgbaImage::new(width, height),
            front: None,
            events,
            closed: false,
            presented: 0,
        })
    }

    #[cfg(test)]
    pub fn frames_presented(&self) -> u64 {
        self.presented
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Last presented frame
    #[cfg(test)]
    pub fn front(&self) -> Option<&RgbaImage> {
        self.front.as_ref()
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.closed {
            Err(Error::Closed)
        } else {
            Ok(())
        }
    }

    fn put(&mut self, x: i64, y: i64, pixel: Rgba<u8>) {
        if x >= 0 && y >= 0 && x < i64::from(self.back.width()) && y < i64::from(self.back.height())
        {
            self.back.put_pixel(x as u32, y as u32, pixel);
        }
    }
}

fn to_pixel(color: Color) -> Rgba<u8> {
    Rgba(color.into_rgba8())
}

/// Liang-Barsky clip of a segment against a `width` x `height` surface.
///
/// Returns the visible part as pixel endpoints, or `None` when nothing of
/// the segment lands on the surface.
fn clip_line(from: Point, to: Point, width: u32, height: u32) -> Option<((i64, i64), (i64, i64))> {
    let (x0, y0) = (f64::from(from.x), f64::from(from.y));
    let (dx, dy) = (f64::from(to.x) - x0, f64::from(to.y) - y0);
    let (max_x, max_y) = (f64::from(width) - 1.0, f64::from(height) - 1.0);

    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for (p, q) in [(-dx, x0), (dx, max_x - x0), (-dy, y0), (dy, max_y - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }

        let t = q / p;
        if p < 0.0 {
            if t > t1 {
                return None;
            }
            t0 = t0.max(t);
        } else {
            if t < t0 {
                return None;
            }
            t1 = t1.min(t);
        }
    }

    let at = |t: f64| ((x0 + t * dx).round() as i64, (y0 + t * dy).round() as i64);

    Some((at(t0), at(t1)))
}

impl Backend for Framebuffer {
    fn size(&self) -> Size<u32> {
        Size::new(self.back.width(), self.back.height())
    }

    fn clear(&mut self, color: Color) -> Result<(), Error> {
        self.ensure_open()?;

        let pixel = to_pixel(color);
        self.back.pixels_mut().for_each(|p| *p = pixel);

        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), Error> {
        self.ensure_open()?;

        let (width, height) = (i64::from(self.back.width()), i64::from(self.back.height()));

        let x0 = i64::from(rect.x).clamp(0, width);
        let y0 = i64::from(rect.y).clamp(0, height);
        let x1 = (i64::from(rect.x) + i64::from(rect.width)).clamp(0, width);
        let y1 = (i64::from(rect.y) + i64::from(rect.height)).clamp(0, height);

        let pixel = to_pixel(color);
        for y in y0..y1 {
            for x in x0..x1 {
                self.back.put_pixel(x as u32, y as u32, pixel);
            }
        }

        Ok(())
    }

    /// Bresenham over the part of the segment that lies on the surface,
    /// both endpoints included
    fn draw_line(&mut self, from: Point, to: Point, color: Color) -> Result<(), Error> {
        self.ensure_open()?;

        let Some((from, to)) = clip_line(from, to, self.back.width(), self.back.height()) else {
            return Ok(());
        };

        let pixel = to_pixel(color);

        let (mut x, mut y) = from;
        let dx = (to.0 - from.0).abs();
        let dy = -(to.1 - from.1).abs();
        let sx = if from.0 < to.0 { 1 } else { -1 };
        let sy = if from.1 < to.1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.put(x, y, pixel);

            if (x, y) == to {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }

        Ok(())
    }

    fn present(&mut self) -> Result<(), Error> {
        self.ensure_open()?;

        match self.front.as_mut() {
            Some(front) => front.copy_from_slice(&self.back),
            None => self.front = Some(self.back.clone()),
        }
        self.presented += 1;

        Ok(())
    }

    fn read_pixels(&self) -> Result<Vec<u8>, Error> {
        self.ensure_open()?;

        self.front
            .as_ref()
            .map(|front| front.as_raw().clone())
            .ok_or(Error::NothingPresented)
    }

    fn poll_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();

        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }

        events
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.events.close();
            log::info!(
                "Closed chart window '{}' after {} frames",
                self.title,
                self.presented
            );
        }
    }
}
