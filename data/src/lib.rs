pub mod buffer;
pub mod config;
pub mod log;
pub mod mapper;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub use buffer::{CandleBuffer, CandleSlot, PriceRange};
pub use config::theme::{Role, Theme};
pub use config::{ChartConfig, FeedSource, Margin, WindowSize};
pub use mapper::{ChartGeometry, CoordinateMapper, Geometry, XCoords};

use ::log::{info, warn};

pub const CONFIG_PATH: &str = "config.json";

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(
        "Chart of width {width}px fits no {column_width}px column (capacity must be at least 1)"
    )]
    Capacity { width: u32, column_width: u32 },
    #[error("Column width {column_width}px is below the minimum of {min}px")]
    ColumnWidth { column_width: u32, min: u32 },
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

/// Reads the chart configuration from `path`.
///
/// A file that exists but does not parse is moved aside to `<name>_old.<ext>`
/// so the next run starts from defaults instead of failing again.
pub fn read_config(path: &Path) -> Result<ChartConfig, ConfigError> {
    let mut file = File::open(path)?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    match serde_json::from_str(&contents) {
        Ok(config) => Ok(config),
        Err(e) => {
            drop(file);

            let backup_path = backup_path(path);

            if let Err(rename_err) = std::fs::rename(path, &backup_path) {
                warn!(
                    "Failed to backup corrupted config file '{}' to '{}': {}",
                    path.display(),
                    backup_path.display(),
                    rename_err
                );
            } else {
                info!(
                    "Backed up corrupted config file to '{}'. It can be restored manually.",
                    backup_path.display()
                );
            }

            Err(e.into())
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = match path.extension() {
        Some(ext) => format!("{stem}_old.{}", ext.to_string_lossy()),
        None => format!("{stem}_old"),
    };

    path.with_file_name(name)
}

pub fn data_path(path_name: Option<&str>) -> PathBuf {
    let base = if let Ok(path) = std::env::var("LIVECANDLES_DATA_PATH") {
        PathBuf::from(path)
    } else {
        dirs_next::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("livecandles")
    };

    match path_name {
        Some(path_name) => base.join(path_name),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "column_width": 10, "title": "BTC" }"#).unwrap();

        let config = read_config(&path).unwrap();
        assert_eq!(config.column_width, 10);
        assert_eq!(config.title, "BTC");
        assert!(path.exists());
    }

    #[test]
    fn corrupted_config_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = File::create(&path).unwrap();
        write!(file, "{{ not json").unwrap();
        drop(file);

        assert!(matches!(read_config(&path), Err(ConfigError::Parse(_))));
        assert!(!path.exists());
        assert!(dir.path().join("config_old.json").exists());
    }

    #[test]
    fn missing_config_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_config(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn backup_name_keeps_extension() {
        assert_eq!(
            backup_path(Path::new("/tmp/a/config.json")),
            PathBuf::from("/tmp/a/config_old.json")
        );
        assert_eq!(backup_path(Path::new("settings")), PathBuf::from("settings_old"));
    }
}
