use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use data::{ChartConfig, Theme};
use feed::Feed;
use tokio::sync::watch;

use crate::chart::{ChartState, render};
use crate::screenshot;
use crate::window::{self, Backend, Event, Key, WindowSettings};

/// Lifecycle of a [`ControlLoop`], in the order it moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Created,
    Initialized,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to open the chart window: {0}")]
    FatalInit(#[source] window::Error),
    #[error("Control loop is {actual:?}, expected {expected:?}")]
    InvalidPhase { expected: Phase, actual: Phase },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub window: WindowSettings,
    /// Presentation tick, also the retry interval of a paused feed
    pub tick: Duration,
    pub screenshot_dir: PathBuf,
    /// Quit once the feed runs dry instead of keeping the last chart on screen
    pub exit_when_exhausted: bool,
}

impl From<&ChartConfig> for Settings {
    fn from(config: &ChartConfig) -> Self {
        Self {
            window: WindowSettings {
                title: config.title.clone(),
                size: config.size.into(),
            },
            tick: config.tick(),
            screenshot_dir: config.screenshot_dir(),
            exit_when_exhausted: config.exit_when_exhausted,
        }
    }
}

/// Totals reported once the loop has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub candles_added: u64,
    pub frames_rendered: u64,
    pub screenshots_taken: u64,
}

/// Runs a feed task and a presentation task side by side on one thread.
///
/// Both tasks share the [`ChartState`]. Every `RefCell` borrow is released
/// before the next `.await`, so neither task can observe the buffer halfway
/// through an update.
pub struct ControlLoop<F, B> {
    state: Rc<RefCell<ChartState>>,
    theme: Theme,
    feed: F,
    settings: Settings,
    backend: Option<B>,
    phase: Rc<watch::Sender<Phase>>,
}

impl<F, B> ControlLoop<F, B>
where
    F: Feed,
    B: Backend,
{
    pub fn new(state: ChartState, theme: Theme, feed: F, settings: Settings) -> Self {
        let (phase, _) = watch::channel(Phase::Created);

        Self {
            state: Rc::new(RefCell::new(state)),
            theme,
            feed,
            settings,
            backend: None,
            phase: Rc::new(phase),
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    #[cfg(test)]
    pub fn state(&self) -> std::cell::Ref<'_, ChartState> {
        self.state.borrow()
    }

    #[cfg(test)]
    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn quit_handle(&self) -> QuitHandle {
        QuitHandle {
            state: Rc::clone(&self.state),
            phase: Rc::clone(&self.phase),
        }
    }

    /// Acquires the backend through `open`.
    ///
    /// On failure the loop stays `Created` and nothing else is touched.
    pub fn initialize<O>(&mut self, open: O) -> Result<(), Error>
    where
        O: FnOnce(&WindowSettings) -> Result<B, window::Error>,
    {
        self.expect_phase(Phase::Created)?;

        let backend = open(&self.settings.window).map_err(Error::FatalInit)?;

        self.backend = Some(backend);
        self.state.borrow_mut().running = true;
        self.phase.send_replace(Phase::Initialized);

        log::info!(
            "Chart '{}' initialized with {} candle slots",
            self.settings.window.title,
            self.state.borrow().buffer.capacity()
        );

        Ok(())
    }

    /// Drives both tasks until the chart is asked to quit, then releases the
    /// backend.
    pub async fn run(&mut self) -> Result<Summary, Error> {
        self.expect_phase(Phase::Initialized)?;

        let Some(backend) = self.backend.as_mut() else {
            return Err(Error::InvalidPhase {
                expected: Phase::Initialized,
                actual: Phase::Created,
            });
        };

        self.phase.send_replace(Phase::Running);
        log::info!("Control loop running");

        let ((frames_rendered, screenshots_taken), candles_added) = tokio::join!(
            present(
                &self.state,
                &self.theme,
                backend,
                &self.settings,
                &self.phase
            ),
            ingest(&self.state, &mut self.feed, &self.settings, &self.phase),
        );

        request_stop(&self.state, &self.phase);

        backend.close();
        self.phase.send_replace(Phase::Stopped);

        let summary = Summary {
            candles_added,
            frames_rendered,
            screenshots_taken,
        };
        log::info!("Control loop stopped: {summary:?}");

        Ok(summary)
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), Error> {
        let actual = self.phase();

        if actual == expected {
            Ok(())
        } else {
            Err(Error::InvalidPhase { expected, actual })
        }
    }
}

/// Asks a running [`ControlLoop`] to stop from outside its tasks.
#[derive(Clone)]
pub struct QuitHandle {
    state: Rc<RefCell<ChartState>>,
    phase: Rc<watch::Sender<Phase>>,
}

impl QuitHandle {
    pub fn signal_quit(&self) {
        log::info!("Quit signalled");
        request_stop(&self.state, &self.phase);
    }

    /// Resolves once the loop is `Stopped`
    pub async fn wait(&self) {
        let mut phase = self.phase.subscribe();
        let _ = phase.wait_for(|phase| *phase == Phase::Stopped).await;
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    #[cfg(test)]
    pub fn state(&self) -> std::cell::Ref<'_, ChartState> {
        self.state.borrow()
    }
}

/// Clears `running` and moves a running loop to `Stopping`.
fn request_stop(state: &RefCell<ChartState>, phase: &watch::Sender<Phase>) {
    state.borrow_mut().running = false;

    phase.send_if_modified(|phase| {
        if *phase == Phase::Running {
            *phase = Phase::Stopping;
            true
        } else {
            false
        }
    });
}

/// Sleeps for `duration` unless the loop starts stopping first; returns
/// `true` in the latter case.
async fn sleep_or_stop(stop: &mut watch::Receiver<Phase>, duration: Duration) -> bool {
    tokio::select! {
        () = tokio::time::sleep(duration) => false,
        _ = stop.wait_for(|phase| *phase >= Phase::Stopping) => true,
    }
}

async fn present<B: Backend>(
    state: &RefCell<ChartState>,
    theme: &Theme,
    backend: &mut B,
    settings: &Settings,
    phase: &watch::Sender<Phase>,
) -> (u64, u64) {
    let mut stop = phase.subscribe();
    let mut rendered: Option<u64> = None;
    let (mut frames, mut screenshots) = (0, 0);

    'tick: loop {
        for event in backend.poll_events() {
            match event {
                Event::Quit => {
                    log::info!("Quit requested");
                    request_stop(state, phase);
                    break 'tick;
                }
                Event::KeyDown(Key::Space) => {
                    let paused = state.borrow_mut().toggle_pause();
                    log::info!("{}", if paused { "Paused" } else { "Resumed" });
                }
                Event::KeyDown(Key::Return) => {
                    match screenshot::take(&*backend, &settings.screenshot_dir, None).await {
                        Ok(path) => {
                            screenshots += 1;
                            log::info!("Screenshot saved to {}", path.display());
                        }
                        Err(e) => log::error!("Failed to take screenshot: {e}"),
                    }
                }
                Event::KeyDown(Key::Other) => {}
            }
        }

        if !state.borrow().running {
            break;
        }

        let revision = state.borrow().buffer.revision();
        if rendered != Some(revision) {
            let state = state.borrow();

            match render::draw(&state.buffer, theme, backend) {
                Ok(()) => frames += 1,
                Err(e) => log::error!("Failed to draw frame: {e}"),
            }
            // a failed frame is retried once the buffer changes again
            rendered = Some(revision);
        }

        if sleep_or_stop(&mut stop, settings.tick).await {
            break;
        }
    }

    (frames, screenshots)
}

async fn ingest<F: Feed>(
    state: &RefCell<ChartState>,
    feed: &mut F,
    settings: &Settings,
    phase: &watch::Sender<Phase>,
) -> u64 {
    let mut stop = phase.subscribe();
    let mut added = 0;

    loop {
        let (running, paused) = {
            let state = state.borrow();
            (state.running, state.paused)
        };

        if !running {
            break;
        }

        if paused {
            if sleep_or_stop(&mut stop, settings.tick).await {
                break;
            }
            continue;
        }

        let next = tokio::select! {
            next = feed.next() => next,
            _ = stop.wait_for(|phase| *phase >= Phase::Stopping) => break,
        };

        match next {
            Ok(Some(candle)) => {
                state.borrow_mut().buffer.add_candle(candle);
                added += 1;
                log::debug!("Added candle {candle}");

                if sleep_or_stop(&mut stop, feed.pacing()).await {
                    break;
                }
            }
            Ok(None) => {
                log::info!("Feed exhausted after {added} candles");

                if settings.exit_when_exhausted {
                    request_stop(state, phase);
                }
                break;
            }
            Err(e) => {
                log::error!("Feed failed, no more candles will be added: {e}");
                break;
            }
        }
    }

    added
}
