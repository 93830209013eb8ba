use crate::Error;
use crate::mapper::{ChartGeometry, CoordinateMapper, Geometry, MIN_COLUMN_WIDTH};
use feed::Candle;

/// Min/max over the lows and highs of every buffered candle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    /// Scans `candles` from scratch; `None` when there are none.
    pub fn from_candles<'a>(candles: impl IntoIterator<Item = &'a Candle>) -> Option<Self> {
        candles.into_iter().fold(None, |range, candle| {
            Some(match range {
                None => PriceRange {
                    min: candle.low(),
                    max: candle.high(),
                },
                Some(PriceRange { min, max }) => PriceRange {
                    min: min.min(candle.low()),
                    max: max.max(candle.high()),
                },
            })
        })
    }

    pub fn length(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.length() > 0.0 && self.length().is_finite())
    }

    /// Length used for scaling prices.
    ///
    /// A flat (or broken) range is treated as one price unit wide: every
    /// price then lands on the bottom edge of the plot, drawing a flat
    /// candle instead of dividing by zero.
    pub fn span(&self) -> f64 {
        if self.is_degenerate() {
            1.0
        } else {
            self.length()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CandleSlot {
    #[default]
    Empty,
    Occupied { candle: Candle, geometry: Geometry },
}

impl CandleSlot {
    pub fn candle(&self) -> Option<&Candle> {
        match self {
            CandleSlot::Empty => None,
            CandleSlot::Occupied { candle, .. } => Some(candle),
        }
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        match self {
            CandleSlot::Empty => None,
            CandleSlot::Occupied { geometry, .. } => Some(geometry),
        }
    }

    pub fn is_occupied(&self) -> bool {
        matches!(self, CandleSlot::Occupied { .. })
    }
}

/// Fixed number of candle slots, oldest on the left.
///
/// Occupied slots always form a prefix. Once every slot is taken, adding a
/// candle drops the oldest one and shifts the rest left by one. Price range
/// and per-slot geometry are recomputed from scratch after each insertion.
#[derive(Debug, Clone)]
pub struct CandleBuffer {
    slots: Vec<CandleSlot>,
    len: usize,
    range: Option<PriceRange>,
    mapper: CoordinateMapper,
    revision: u64,
}

impl CandleBuffer {
    pub fn new(geometry: ChartGeometry) -> Result<Self, Error> {
        if geometry.column_width < MIN_COLUMN_WIDTH {
            return Err(Error::ColumnWidth {
                column_width: geometry.column_width,
                min: MIN_COLUMN_WIDTH,
            });
        }

        let capacity = geometry.cols();

        if capacity < 1 {
            return Err(Error::Capacity {
                width: geometry.size.width,
                column_width: geometry.column_width,
            });
        }

        Ok(Self {
            slots: vec![CandleSlot::Empty; capacity],
            len: 0,
            range: None,
            mapper: CoordinateMapper::new(geometry),
            revision: 0,
        })
    }

    pub fn add_candle(&mut self, candle: Candle) {
        if self.is_full() {
            let evicted = self.slots[0].candle().map(Candle::sequence);
            self.slots.rotate_left(1);
            log::trace!("Evicted candle {evicted:?} to make room for #{}", candle.sequence());
        } else {
            self.len += 1;
        }

        self.slots[self.len - 1] = CandleSlot::Occupied {
            candle,
            geometry: Geometry::default(),
        };

        self.recompute();
        self.revision += 1;
    }

    fn recompute(&mut self) {
        let range = PriceRange::from_candles(self.slots.iter().filter_map(CandleSlot::candle));

        if let Some(range) = range
            && range.is_degenerate()
        {
            log::debug!(
                "Flat price range at {}, scaling with a unit span",
                range.min
            );
        }

        self.range = range;

        let Some(range) = range else {
            return;
        };

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let CandleSlot::Occupied { candle, geometry } = slot {
                *geometry = self.mapper.geometry_for(index, candle, &range);
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    pub fn slots(&self) -> &[CandleSlot] {
        &self.slots
    }

    /// Occupied slots in buffer order, oldest first
    pub fn occupied(&self) -> impl Iterator<Item = (&Candle, &Geometry)> {
        self.slots[..self.len].iter().filter_map(|slot| match slot {
            CandleSlot::Occupied { candle, geometry } => Some((candle, geometry)),
            CandleSlot::Empty => None,
        })
    }

    pub fn candles(&self) -> impl Iterator<Item = &Candle> {
        self.occupied().map(|(candle, _)| candle)
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.len
            .checked_sub(1)
            .and_then(|last| self.slots[last].candle())
    }

    pub fn range(&self) -> Option<PriceRange> {
        self.range
    }

    /// Bumped once per `add_candle`; compare against a stored value to tell
    /// whether the buffer changed since it was last drawn.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn geometry(&self) -> &ChartGeometry {
        self.mapper.geometry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Margin;
    use iced_core::Size;

    /// 800px wide with 15px columns gives 42 slots
    fn geometry() -> ChartGeometry {
        ChartGeometry::new(Size::new(800, 600), Margin { x: 15, y: 20 }, 15)
    }

    /// Width chosen so that exactly `capacity` columns fit
    fn geometry_with_capacity(capacity: u32) -> ChartGeometry {
        ChartGeometry::new(Size::new(capacity * 10, 100), Margin { x: 0, y: 10 }, 8)
    }

    fn candle(sequence: u64, open: f64, close: f64) -> Candle {
        Candle::new(sequence, open, open.max(close), open.min(close), close)
    }

    fn sequences(buffer: &CandleBuffer) -> Vec<u64> {
        buffer.candles().map(Candle::sequence).collect()
    }

    #[test]
    fn rejects_zero_capacity() {
        let geometry = ChartGeometry::new(Size::new(10, 100), Margin::default(), 15);
        assert_eq!(
            CandleBuffer::new(geometry).unwrap_err(),
            Error::Capacity {
                width: 10,
                column_width: 15
            }
        );
    }

    #[test]
    fn rejects_columns_too_narrow_for_a_wick() {
        for column_width in 0..MIN_COLUMN_WIDTH {
            let geometry =
                ChartGeometry::new(Size::new(800, 600), Margin { x: 15, y: 20 }, column_width);
            assert_eq!(
                CandleBuffer::new(geometry).unwrap_err(),
                Error::ColumnWidth {
                    column_width,
                    min: 3
                }
            );
        }

        let geometry = ChartGeometry::new(Size::new(800, 600), Margin { x: 15, y: 20 }, 3);
        assert_eq!(CandleBuffer::new(geometry).unwrap().capacity(), 213);
    }

    #[test]
    fn capacity_comes_from_geometry() {
        assert_eq!(CandleBuffer::new(geometry()).unwrap().capacity(), 42);
        assert_eq!(
            CandleBuffer::new(geometry_with_capacity(3)).unwrap().capacity(),
            3
        );
    }

    #[test]
    fn fills_left_to_right() {
        let mut buffer = CandleBuffer::new(geometry()).unwrap();
        assert!(buffer.is_empty());
        assert!(buffer.range().is_none());

        for i in 0..5 {
            buffer.add_candle(candle(i, 10.0 + i as f64, 11.0 + i as f64));
        }

        assert_eq!(buffer.len(), 5);
        assert!(buffer.slots()[..5].iter().all(CandleSlot::is_occupied));
        assert!(buffer.slots()[5..].iter().all(|s| !s.is_occupied()));
        assert_eq!(sequences(&buffer), vec![0, 1, 2, 3, 4]);
        assert_eq!(buffer.latest().map(Candle::sequence), Some(4));
    }

    #[test]
    fn capacity_three_evicts_oldest() {
        let mut buffer = CandleBuffer::new(geometry_with_capacity(3)).unwrap();

        buffer.add_candle(candle(1, 1.0, 2.0));
        buffer.add_candle(candle(2, 2.0, 1.0));
        buffer.add_candle(candle(3, 3.0, 4.0));
        assert!(buffer.is_full());
        assert_eq!(sequences(&buffer), vec![1, 2, 3]);

        buffer.add_candle(candle(4, 5.0, 4.0));
        assert_eq!(buffer.len(), 3);
        assert_eq!(sequences(&buffer), vec![2, 3, 4]);

        let range = buffer.range().unwrap();
        assert_eq!((range.min, range.max), (1.0, 5.0));
    }

    #[test]
    fn range_shrinks_after_eviction() {
        let mut buffer = CandleBuffer::new(geometry_with_capacity(2)).unwrap();

        buffer.add_candle(Candle::new(0, 50.0, 100.0, 1.0, 60.0));
        buffer.add_candle(Candle::new(1, 10.0, 12.0, 9.0, 11.0));
        assert_eq!(buffer.range(), Some(PriceRange { min: 1.0, max: 100.0 }));

        buffer.add_candle(Candle::new(2, 11.0, 13.0, 10.0, 12.0));
        assert_eq!(buffer.range(), Some(PriceRange { min: 9.0, max: 13.0 }));
    }

    #[test]
    fn geometry_is_refreshed_for_every_slot() {
        let mut buffer = CandleBuffer::new(geometry()).unwrap();

        buffer.add_candle(Candle::new(0, 10.0, 20.0, 10.0, 20.0));
        let before = *buffer.slots()[0].geometry().unwrap();
        assert_eq!((before.y_wick_high, before.y_wick_low), (20, 580));

        // a wider range rescales the first candle too
        buffer.add_candle(Candle::new(1, 20.0, 30.0, 20.0, 30.0));
        let after = *buffer.slots()[0].geometry().unwrap();
        assert_eq!(after.y_wick_low, 580);
        assert_eq!(after.y_wick_high, 300);

        let second = *buffer.slots()[1].geometry().unwrap();
        assert_eq!(second.x_start, after.x_end);
    }

    #[test]
    fn geometry_follows_slot_after_shift() {
        let mut buffer = CandleBuffer::new(geometry_with_capacity(2)).unwrap();
        for i in 0..3 {
            buffer.add_candle(candle(i, 1.0, 2.0));
        }

        let x_starts: Vec<i32> = buffer.occupied().map(|(_, g)| g.x_start).collect();
        assert_eq!(x_starts, vec![0, 8]);
    }

    #[test]
    fn single_flat_candle_uses_unit_span() {
        let mut buffer = CandleBuffer::new(geometry()).unwrap();
        buffer.add_candle(Candle::new(0, 5.0, 5.0, 5.0, 5.0));

        let range = buffer.range().unwrap();
        assert!(range.is_degenerate());
        assert_eq!(range.length(), 0.0);
        assert_eq!(range.span(), 1.0);

        let g = buffer.slots()[0].geometry().unwrap();
        assert_eq!(g.y_wick_high, g.y_wick_low);
        assert_eq!(g.y_body_start, g.y_body_end);
    }

    #[test]
    fn revision_counts_insertions() {
        let mut buffer = CandleBuffer::new(geometry_with_capacity(2)).unwrap();
        assert_eq!(buffer.revision(), 0);

        for i in 0..5 {
            buffer.add_candle(candle(i, 1.0, 2.0));
        }
        assert_eq!(buffer.revision(), 5);
    }
}
