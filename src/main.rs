mod chart;
mod control;
mod logger;
mod screenshot;
mod window;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use chart::ChartState;
use control::ControlLoop;
use data::{ChartConfig, ConfigError, FeedSource};
use feed::{CsvFeed, Feed, SyntheticFeed};
use window::{EventReceiver, Framebuffer, terminal};

fn main() -> ExitCode {
    if let Err(e) = logger::setup(cfg!(debug_assertions)) {
        eprintln!("Failed to initialize logger: {e}");
    }

    let config = load_config(std::env::args().nth(1).map(PathBuf::from));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(launch(config));

    // the stdin reader may still be parked in a blocking read
    runtime.shutdown_timeout(Duration::from_millis(100));

    code
}

/// Reads the config at `path`, or `config.json` in the data directory.
/// Anything unreadable falls back to defaults.
fn load_config(path: Option<PathBuf>) -> ChartConfig {
    let path = path.unwrap_or_else(|| data::data_path(Some(data::CONFIG_PATH)));

    match data::read_config(&path) {
        Ok(config) => {
            log::info!("Loaded config from {}", path.display());
            config
        }
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No config at {}, using defaults", path.display());
            ChartConfig::default()
        }
        Err(e) => {
            log::warn!("Failed to read config {}: {e}. Using defaults", path.display());
            ChartConfig::default()
        }
    }
}

async fn launch(config: ChartConfig) -> ExitCode {
    let state = match ChartState::new(config.geometry()) {
        Ok(state) => state,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let (events, receiver) = window::channel();
    terminal::spawn(events);
    log::info!("Controls: 'p' pause/resume, enter screenshot, 'q' quit");

    let pacing = config.feed.pacing();

    match config.feed.clone() {
        FeedSource::Csv { path, .. } => match CsvFeed::open(&path, pacing) {
            Ok(feed) => drive(state, &config, feed, receiver).await,
            Err(e) => {
                log::error!("Failed to open feed {}: {e}", path.display());
                ExitCode::FAILURE
            }
        },
        FeedSource::Synthetic {
            seed,
            start_price,
            volatility,
            limit,
            ..
        } => {
            let feed = match seed {
                Some(seed) => SyntheticFeed::seeded(seed, start_price, volatility, pacing),
                None => SyntheticFeed::new(start_price, volatility, pacing),
            };
            let feed = match limit {
                Some(limit) => feed.with_limit(limit),
                None => feed,
            };

            drive(state, &config, feed, receiver).await
        }
    }
}

async fn drive<F: Feed>(
    state: ChartState,
    config: &ChartConfig,
    feed: F,
    receiver: EventReceiver,
) -> ExitCode {
    let mut control = ControlLoop::new(
        state,
        config.theme.clone(),
        feed,
        control::Settings::from(config),
    );

    if let Err(e) = control.initialize(|settings| Framebuffer::open(settings, receiver)) {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }

    let quit = control.quit_handle();
    let on_ctrl_c = async {
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    log::info!("Received Ctrl-C");
                    quit.signal_quit();
                }
                Err(e) => log::warn!("Failed to listen for Ctrl-C: {e}"),
            },
            () = quit.wait() => {}
        }
    };

    let (result, ()) = tokio::join!(control.run(), on_ctrl_c);

    match result {
        Ok(summary) => {
            log::info!(
                "Added {} candles, rendered {} frames, took {} screenshots",
                summary.candles_added,
                summary.frames_rendered,
                summary.screenshots_taken
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
