use std::path::PathBuf;
use std::{fs, io};

use crate::data_path;

pub const LOG_FILE: &str = "livecandles-current.log";
pub const PREVIOUS_LOG_FILE: &str = "livecandles-previous.log";

/// The log file is never allowed to grow past this (50 MiB)
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// `chrono` format of the time prefix on every log line
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.3f";

/// Last line written before the process aborts on an oversized log.
pub fn size_limit_line(timestamp: impl std::fmt::Display, limit: u64) -> String {
    format!(
        "\n{timestamp}:FATAL -- Log file would exceed the maximum allowed size of {limit} bytes\n"
    )
}

/// Path of the current log file, creating its directory if needed.
pub fn path() -> Result<PathBuf, Error> {
    let full_path = data_path(Some(LOG_FILE));

    let parent = full_path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid log file path"))?;

    if !parent.exists() {
        fs::create_dir_all(parent)?;
    }

    Ok(full_path)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    SetLog(#[from] log::SetLoggerError),
    #[error(transparent)]
    ParseLevel(#[from] log::ParseLevelError),
}
