use crate::{Candle, Feed, FeedError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Random-walk candle generator.
///
/// Each candle opens at the previous close and moves by at most
/// `volatility` (a fraction of the price) in either direction; wicks extend
/// up to half that distance past the body.
#[derive(Debug)]
pub struct SyntheticFeed {
    rng: StdRng,
    last_close: f64,
    volatility: f64,
    pacing: Duration,
    limit: Option<u64>,
    produced: u64,
}

impl SyntheticFeed {
    pub fn new(start_price: f64, volatility: f64, pacing: Duration) -> Self {
        Self::with_rng(StdRng::from_entropy(), start_price, volatility, pacing)
    }

    /// Same seed, same candles
    pub fn seeded(seed: u64, start_price: f64, volatility: f64, pacing: Duration) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), start_price, volatility, pacing)
    }

    fn with_rng(rng: StdRng, start_price: f64, volatility: f64, pacing: Duration) -> Self {
        Self {
            rng,
            last_close: start_price.abs().max(f64::EPSILON),
            volatility: volatility.abs(),
            pacing,
            limit: None,
            produced: 0,
        }
    }

    /// Stops the feed after `limit` candles
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    fn step(&mut self) -> Candle {
        let open = self.last_close;
        let swing = if self.volatility > 0.0 {
            self.rng.gen_range(-self.volatility..self.volatility)
        } else {
            0.0
        };
        let close = (open * (1.0 + swing)).max(f64::EPSILON);

        let (body_low, body_high) = (open.min(close), open.max(close));
        let mut wick = || {
            if self.volatility > 0.0 {
                self.rng.gen_range(0.0..self.volatility / 2.0)
            } else {
                0.0
            }
        };
        let high = body_high * (1.0 + wick());
        let low = body_low * (1.0 - wick());

        let candle = Candle::new(self.produced, open, high, low, close);

        self.last_close = close;
        self.produced += 1;

        candle
    }
}

impl Feed for SyntheticFeed {
    fn pacing(&self) -> Duration {
        self.pacing
    }

    async fn next(&mut self) -> Result<Option<Candle>, FeedError> {
        if self.limit.is_some_and(|limit| self.produced >= limit) {
            return Ok(None);
        }

        Ok(Some(self.step()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACING: Duration = Duration::from_millis(1);

    async fn collect(feed: &mut SyntheticFeed) -> Vec<Candle> {
        let mut out = Vec::new();
        while let Some(candle) = feed.next().await.unwrap() {
            out.push(candle);
        }
        out
    }

    #[tokio::test]
    async fn same_seed_same_series() {
        let mut a = SyntheticFeed::seeded(7, 100.0, 0.02, PACING).with_limit(50);
        let mut b = SyntheticFeed::seeded(7, 100.0, 0.02, PACING).with_limit(50);

        assert_eq!(collect(&mut a).await, collect(&mut b).await);
    }

    #[tokio::test]
    async fn candles_are_well_formed_and_chained() {
        let mut feed = SyntheticFeed::seeded(42, 250.0, 0.05, PACING).with_limit(200);
        let candles = collect(&mut feed).await;
        assert_eq!(candles.len(), 200);

        for pair in candles.windows(2) {
            assert_eq!(pair[1].open(), pair[0].close());
            assert_eq!(pair[1].sequence(), pair[0].sequence() + 1);
        }

        for c in &candles {
            let (lo, hi) = c.body();
            assert!(c.high() >= hi && c.low() <= lo, "{c}");
            assert!(c.low() > 0.0);
        }
    }

    #[tokio::test]
    async fn zero_volatility_is_flat() {
        let mut feed = SyntheticFeed::seeded(1, 10.0, 0.0, PACING).with_limit(3);
        for c in collect(&mut feed).await {
            assert_eq!((c.open(), c.high(), c.low(), c.close()), (10.0, 10.0, 10.0, 10.0));
        }
    }
}
