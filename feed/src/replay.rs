use crate::{Candle, Feed, FeedError};

use std::collections::VecDeque;
use std::time::Duration;

/// Plays back a fixed list of candles in order.
#[derive(Debug, Clone)]
pub struct ReplayFeed {
    candles: VecDeque<Candle>,
    pacing: Duration,
}

impl ReplayFeed {
    pub fn new(candles: impl IntoIterator<Item = Candle>, pacing: Duration) -> Self {
        Self {
            candles: candles.into_iter().collect(),
            pacing,
        }
    }

    /// Builds a feed from `(open, high, low, close)` tuples, numbering them
    /// from zero in iteration order.
    pub fn from_ohlc(rows: impl IntoIterator<Item = (f64, f64, f64, f64)>, pacing: Duration) -> Self {
        let candles = rows
            .into_iter()
            .enumerate()
            .map(|(i, (open, high, low, close))| Candle::new(i as u64, open, high, low, close));

        Self::new(candles, pacing)
    }

    pub fn remaining(&self) -> usize {
        self.candles.len()
    }
}

impl Feed for ReplayFeed {
    fn pacing(&self) -> Duration {
        self.pacing
    }

    async fn next(&mut self) -> Result<Option<Candle>, FeedError> {
        Ok(self.candles.pop_front())
    }
}
