use feed::Candle;
use iced_core::Size;
use livecandles_data::mapper::MIN_COLUMN_WIDTH;
use livecandles_data::{CandleBuffer, ChartGeometry, Margin};
use proptest::prelude::*;

fn candle_strategy() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (1.0f64..1_000.0, 1.0f64..1_000.0, 0.0f64..50.0, 0.0f64..50.0).prop_map(
        |(open, close, up, down)| {
            let high = open.max(close) + up;
            let low = (open.min(close) - down).max(0.0);
            (open, high, low, close)
        },
    )
}

fn buffer(capacity: u32) -> CandleBuffer {
    // 10px of width per 8px column leaves exactly `capacity` columns
    let geometry = ChartGeometry::new(
        Size::new(capacity * 10, 400),
        Margin { x: 5, y: 20 },
        8,
    );
    CandleBuffer::new(geometry).unwrap()
}

proptest! {
    #[test]
    fn occupancy_is_a_bounded_prefix(
        capacity in 1u32..40,
        ohlc in prop::collection::vec(candle_strategy(), 0..120),
    ) {
        let mut buffer = buffer(capacity);
        for (i, &(o, h, l, c)) in ohlc.iter().enumerate() {
            buffer.add_candle(Candle::new(i as u64, o, h, l, c));
        }

        let expected = ohlc.len().min(capacity as usize);
        prop_assert_eq!(buffer.len(), expected);
        prop_assert!(buffer.slots()[..expected].iter().all(|s| s.is_occupied()));
        prop_assert!(buffer.slots()[expected..].iter().all(|s| !s.is_occupied()));
    }

    #[test]
    fn keeps_most_recent_in_arrival_order(
        capacity in 1u32..40,
        ohlc in prop::collection::vec(candle_strategy(), 1..120),
    ) {
        let mut buffer = buffer(capacity);
        for (i, &(o, h, l, c)) in ohlc.iter().enumerate() {
            buffer.add_candle(Candle::new(i as u64, o, h, l, c));
        }

        let n = ohlc.len() as u64;
        let first = n.saturating_sub(u64::from(capacity));
        let kept: Vec<u64> = buffer.candles().map(Candle::sequence).collect();
        prop_assert_eq!(kept, (first..n).collect::<Vec<_>>());
    }

    #[test]
    fn range_bounds_every_candle(
        capacity in 1u32..20,
        ohlc in prop::collection::vec(candle_strategy(), 1..60),
    ) {
        let mut buffer = buffer(capacity);
        for (i, &(o, h, l, c)) in ohlc.iter().enumerate() {
            buffer.add_candle(Candle::new(i as u64, o, h, l, c));
        }

        let range = buffer.range().unwrap();
        let mut lowest = f64::INFINITY;
        let mut highest = f64::NEG_INFINITY;
        for candle in buffer.candles() {
            prop_assert!(range.min <= candle.low() && candle.high() <= range.max);
            lowest = lowest.min(candle.low());
            highest = highest.max(candle.high());
        }
        // no stale extremes from evicted candles
        prop_assert_eq!(range.min, lowest);
        prop_assert_eq!(range.max, highest);
    }

    #[test]
    fn geometry_stays_inside_plot(
        capacity in 1u32..20,
        ohlc in prop::collection::vec(candle_strategy(), 1..60),
    ) {
        let mut buffer = buffer(capacity);
        for (i, &(o, h, l, c)) in ohlc.iter().enumerate() {
            buffer.add_candle(Candle::new(i as u64, o, h, l, c));
        }

        let top = buffer.geometry().plot_top();
        let bottom = buffer.geometry().plot_bottom();

        for (_, g) in buffer.occupied() {
            prop_assert!(g.x_start < g.x_center && g.x_center < g.x_end);
            prop_assert_eq!(g.x_end - g.x_start, 8);
            prop_assert!(top <= g.y_wick_high && g.y_wick_high <= g.y_body_end);
            prop_assert!(g.y_body_end <= g.y_body_start);
            prop_assert!(g.y_body_start <= g.y_wick_low && g.y_wick_low <= bottom);
        }
    }

    #[test]
    fn every_accepted_column_width_centers_the_wick(
        column_width in 0u32..40,
        ohlc in prop::collection::vec(candle_strategy(), 1..30),
    ) {
        let geometry = ChartGeometry::new(Size::new(800, 400), Margin { x: 5, y: 20 }, column_width);

        match CandleBuffer::new(geometry) {
            Ok(mut buffer) => {
                prop_assert!(column_width >= MIN_COLUMN_WIDTH);
                for (i, &(o, h, l, c)) in ohlc.iter().enumerate() {
                    buffer.add_candle(Candle::new(i as u64, o, h, l, c));
                }
                for (_, g) in buffer.occupied() {
                    prop_assert!(g.x_start < g.x_center && g.x_center < g.x_end);
                }
            }
            Err(_) => prop_assert!(column_width < MIN_COLUMN_WIDTH),
        }
    }
}
