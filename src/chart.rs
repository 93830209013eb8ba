pub mod render;

use data::{CandleBuffer, ChartGeometry};

/// State shared by the feed and presentation tasks.
///
/// The feed task is the only writer of `buffer`; `paused` and `running` are
/// written by the presentation side.
#[derive(Debug)]
pub struct ChartState {
    pub buffer: CandleBuffer,
    pub paused: bool,
    pub running: bool,
}

impl ChartState {
    pub fn new(geometry: ChartGeometry) -> Result<Self, data::Error> {
        Ok(Self {
            buffer: CandleBuffer::new(geometry)?,
            paused: false,
            running: false,
        })
    }

    /// Flips `paused` and returns the new value
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data::Margin;
    use iced_core::Size;

    #[test]
    fn starts_idle_and_unpaused() {
        let state = ChartState::new(ChartGeometry::new(
            Size::new(800, 600),
            Margin { x: 15, y: 20 },
            15,
        ))
        .unwrap();

        assert!(!state.paused);
        assert!(!state.running);
        assert_eq!(state.buffer.capacity(), 42);
    }

    #[test]
    fn toggle_pause_flips() {
        let mut state =
            ChartState::new(ChartGeometry::new(Size::new(100, 100), Margin::default(), 10))
                .unwrap();

        assert!(state.toggle_pause());
        assert!(!state.toggle_pause());
    }

    #[test]
    fn capacity_error_surfaces() {
        let result = ChartState::new(ChartGeometry::new(
            Size::new(800, 600),
            Margin::default(),
            1000,
        ));

        assert!(matches!(result, Err(data::Error::Capacity { .. })));
    }
}
