use std::path::PathBuf;
use std::time::Duration;

use iced_core::Size;
use serde::{Deserialize, Serialize};

use crate::mapper::ChartGeometry;

pub mod theme;

pub use theme::Theme;

pub const DEFAULT_TITLE: &str = "Trading Chart";
pub const DEFAULT_COLUMN_WIDTH: u32 = 15;
pub const DEFAULT_TICK_MS: u64 = 10;

/// Space left between the window edge and the plot, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Margin {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

impl From<WindowSize> for Size<u32> {
    fn from(size: WindowSize) -> Self {
        Size::new(size.width, size.height)
    }
}

/// Where candles come from.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedSource {
    Csv {
        path: PathBuf,
        #[serde(default = "default_pacing_ms")]
        pacing_ms: u64,
    },
    Synthetic {
        #[serde(default)]
        seed: Option<u64>,
        #[serde(default = "default_start_price")]
        start_price: f64,
        #[serde(default = "default_volatility")]
        volatility: f64,
        #[serde(default = "default_pacing_ms")]
        pacing_ms: u64,
        #[serde(default)]
        limit: Option<u64>,
    },
}

fn default_pacing_ms() -> u64 {
    500
}

fn default_start_price() -> f64 {
    100.0
}

fn default_volatility() -> f64 {
    0.01
}

impl Default for FeedSource {
    fn default() -> Self {
        FeedSource::Synthetic {
            seed: None,
            start_price: default_start_price(),
            volatility: default_volatility(),
            pacing_ms: default_pacing_ms(),
            limit: None,
        }
    }
}

impl FeedSource {
    pub fn pacing(&self) -> Duration {
        match self {
            FeedSource::Csv { pacing_ms, .. } | FeedSource::Synthetic { pacing_ms, .. } => {
                Duration::from_millis(*pacing_ms)
            }
        }
    }
}

/// Everything read from `config.json`. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChartConfig {
    pub title: String,
    pub size: WindowSize,
    pub column_width: u32,
    pub margin: Margin,
    pub theme: Theme,
    pub feed: FeedSource,
    pub tick_ms: u64,
    /// Defaults to the data directory when unset
    pub screenshot_dir: Option<PathBuf>,
    pub exit_when_exhausted: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            size: WindowSize::default(),
            column_width: DEFAULT_COLUMN_WIDTH,
            margin: Margin { x: 15, y: 20 },
            theme: Theme::default(),
            feed: FeedSource::default(),
            tick_ms: DEFAULT_TICK_MS,
            screenshot_dir: None,
            exit_when_exhausted: false,
        }
    }
}

impl ChartConfig {
    pub fn geometry(&self) -> ChartGeometry {
        ChartGeometry::new(self.size.into(), self.margin, self.column_width)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        self.screenshot_dir
            .clone()
            .unwrap_or_else(|| crate::data_path(None))
    }
}
