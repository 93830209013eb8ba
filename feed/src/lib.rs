pub mod csv;
pub mod replay;
pub mod synthetic;

pub use self::csv::CsvFeed;
pub use replay::ReplayFeed;
pub use synthetic::SyntheticFeed;

use std::fmt;
use std::time::Duration;

/// Which way a candle closed relative to its open.
///
/// A candle whose close equals its open counts as `Bearish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Bullish => write!(f, "Bullish"),
            Direction::Bearish => write!(f, "Bearish"),
        }
    }
}

/// One OHLC price bar.
///
/// `sequence` is the arrival order assigned by the feed that produced the
/// candle. It is never drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    sequence: u64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl Candle {
    pub fn new(sequence: u64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            sequence,
            open,
            high,
            low,
            close,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn direction(&self) -> Direction {
        if self.close > self.open {
            Direction::Bullish
        } else {
            Direction::Bearish
        }
    }

    /// Lower and upper edge of the body, independent of direction
    pub fn body(&self) -> (f64, f64) {
        (self.open.min(self.close), self.open.max(self.close))
    }

    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite())
    }
}

impl fmt::Display for Candle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} O:{} H:{} L:{} C:{}",
            self.sequence, self.open, self.high, self.low, self.close
        )
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("Feed has no usable rows: {0}")]
    Empty(String),
}

/// A producer of candles.
///
/// `next` resolving to `Ok(None)` means the feed is exhausted, which is an
/// expected outcome rather than an error. Callers sleep for `pacing` between
/// two successful calls.
#[allow(async_fn_in_trait)]
pub trait Feed {
    fn pacing(&self) -> Duration;

    async fn next(&mut self) -> Result<Option<Candle>, FeedError>;
}
