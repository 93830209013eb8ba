use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process,
    sync::mpsc,
    thread,
};

use data::log::{MAX_FILE_SIZE, TIMESTAMP_FORMAT};

pub use data::log::Error;

const TARGETS: [&str; 3] = ["livecandles", "livecandles_data", "livecandles_feed"];

/// Installs the global logger.
///
/// Debug builds print to stdout. Release builds write to
/// `livecandles-current.log` in the data directory, keeping the previous
/// run as `livecandles-previous.log`.
pub fn setup(is_debug: bool) -> Result<(), Error> {
    let level_filter = level_from(std::env::var("RUST_LOG").ok().as_deref(), is_debug)?;

    let mut io_sink = fern::Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "{}:{} -- {}",
            chrono::Local::now().format(TIMESTAMP_FORMAT),
            record.level(),
            message
        ));
    });

    if is_debug {
        io_sink = io_sink.chain(io::stdout());
    } else {
        let log_path = data::log::path()?;
        rotate(&log_path)?;

        let writer: Box<dyn Write + Send> = Box::new(BackgroundWriter::spawn(log_path)?);
        io_sink = io_sink.chain(writer);
    }

    TARGETS
        .iter()
        .fold(
            fern::Dispatch::new()
                .level(log::LevelFilter::Off)
                .level_for("panic", log::LevelFilter::Error),
            |dispatch, target| dispatch.level_for(*target, level_filter),
        )
        .chain(io_sink)
        .apply()?;

    Ok(())
}

/// `RUST_LOG` holds a single level name; without it debug builds log at
/// debug and release builds at info.
fn level_from(env: Option<&str>, is_debug: bool) -> Result<log::LevelFilter, Error> {
    let default_level = if is_debug {
        log::Level::Debug
    } else {
        log::Level::Info
    };

    Ok(env
        .map(str::parse::<log::Level>)
        .transpose()?
        .unwrap_or(default_level)
        .to_level_filter())
}

/// Moves the last run's log aside, replacing any older copy.
fn rotate(log_path: &Path) -> io::Result<()> {
    let dir = log_path.parent().unwrap_or(Path::new("."));
    let previous = dir.join(data::log::PREVIOUS_LOG_FILE);

    if previous.exists() {
        fs::remove_file(&previous)?;
    }

    if log_path.exists() {
        fs::rename(log_path, &previous)?;
    }

    Ok(())
}

enum Message {
    Line(Vec<u8>),
    Flush,
    Shutdown,
}

/// Hands log lines to a dedicated thread so callers never block on disk.
struct BackgroundWriter {
    sender: mpsc::Sender<Message>,
    _thread: thread::JoinHandle<()>,
}

impl BackgroundWriter {
    fn spawn(path: PathBuf) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel();

        let thread = thread::Builder::new()
            .name("livecandles-log".to_string())
            .spawn(move || {
                let mut file = match LogFile::open(&path, MAX_FILE_SIZE) {
                    Ok(file) => file,
                    Err(e) => {
                        eprintln!("Failed to open log file {}: {e}", path.display());
                        return;
                    }
                };

                while let Ok(message) = receiver.recv() {
                    let result = match message {
                        Message::Line(bytes) => file.write_all(&bytes),
                        Message::Flush => file.flush(),
                        Message::Shutdown => break,
                    };

                    if let Err(e) = result {
                        eprintln!("Logging error: {e}");
                    }
                }
            })?;

        Ok(Self {
            sender,
            _thread: thread,
        })
    }

    fn send(&self, message: Message) -> io::Result<()> {
        self.sender
            .send(message)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "Log writer thread is gone"))
    }
}

impl Write for BackgroundWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.send(Message::Line(buf.to_vec()))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send(Message::Flush)
    }
}

impl Drop for BackgroundWriter {
    fn drop(&mut self) {
        let _ = self.sender.send(Message::Shutdown);
    }
}

/// Append-only log file with a hard size cap.
struct LogFile {
    file: fs::File,
    size: u64,
    limit: u64,
}

impl LogFile {
    fn open(path: &Path, limit: u64) -> io::Result<Self> {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let size = file.metadata()?.len();

        Ok(Self { file, size, limit })
    }

    fn would_exceed(&self, len: usize) -> bool {
        self.size + len as u64 > self.limit
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.would_exceed(buf.len()) {
            let message = data::log::size_limit_line(
                chrono::Local::now().format(TIMESTAMP_FORMAT),
                self.limit,
            );

            eprintln!("{message}");
            let _ = self.file.write_all(message.as_bytes());
            let _ = self.file.flush();

            process::abort();
        }

        let written = self.file.write(buf)?;
        self.size += written as u64;

        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
