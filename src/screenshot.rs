use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::chart::render::{self, Capture};
use crate::window::{self, Backend};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to capture frame: {0}")]
    Capture(#[from] window::Error),
    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Screenshot task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// `screenshot_YYYYMMDD_HHMMSS.png`
pub fn file_name(at: DateTime<Local>) -> String {
    format!("screenshot_{}.png", at.format("%Y%m%d_%H%M%S"))
}

/// Reads back the last presented frame and writes it as a PNG into `dir`.
///
/// Encoding runs on the blocking pool, so the chart keeps ticking meanwhile.
pub async fn take<B>(surface: &B, dir: &Path, name: Option<&str>) -> Result<PathBuf, Error>
where
    B: Backend + ?Sized,
{
    let capture = render::capture(surface)?;

    let name = name.map_or_else(|| file_name(Local::now()), str::to_owned);
    let path = dir.join(name);

    save(capture, path).await
}

pub async fn save(capture: Capture, path: PathBuf) -> Result<PathBuf, Error> {
    tokio::task::spawn_blocking(move || -> Result<PathBuf, Error> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        image::save_buffer(
            &path,
            &capture.pixels,
            capture.size.width,
            capture.size.height,
            image::ColorType::Rgba8,
        )?;

        Ok(path)
    })
    .await?
}
