pub mod command;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use crate::config::RegionConfig;
use crate::signals::Signal;

pub use command::CommandCapture;

/// Area of the target window to grab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureRegion {
    Window,
    Rect { x: i32, y: i32, width: i32, height: i32 },
}

impl From<RegionConfig> for CaptureRegion {
    fn from(region: RegionConfig) -> Self {
        if region.width > 0 && region.height > 0 {
            CaptureRegion::Rect {
                x: region.x,
                y: region.y,
                width: region.width,
                height: region.height,
            }
        } else {
            CaptureRegion::Window
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub window_title: String,
    pub region: CaptureRegion,
    pub output: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("No capture command configured")]
    NotConfigured,

    #[error("Failed to prepare screenshot folder {path}: {source}")]
    Folder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove stale screenshot {path}: {source}")]
    Stale {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch capture command {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Capture command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Capture command produced no image at {0}")]
    NoOutput(PathBuf),
}

/// Grabs the terminal's window into an image file
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// Returns the path of the saved image
    async fn capture(&self, request: &CaptureRequest) -> Result<PathBuf, CaptureError>;
}

/// Used when no capture command is configured; every grab fails so the
/// rest of the pipeline runs without a screenshot
pub struct DisabledCapture;

#[async_trait]
impl ScreenCapture for DisabledCapture {
    async fn capture(&self, _request: &CaptureRequest) -> Result<PathBuf, CaptureError> {
        Err(CaptureError::NotConfigured)
    }
}

/// `<SYMBOL>_<STRATEGY>_<SESSION>_<HH-MM-SS>.png` inside `day_folder`
pub fn screenshot_path(day_folder: &Path, signal: &Signal) -> PathBuf {
    let file_name = format!(
        "{}_{}_{}_{}.png",
        signal.symbol(),
        signal.strategy(),
        signal.session(),
        signal.timestamp().format("%H-%M-%S"),
    );
    day_folder.join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::types::signal_at;

    #[test]
    fn test_region_zero_size_means_window() {
        let region = RegionConfig { x: 10, y: 10, width: 0, height: 600 };
        assert_eq!(CaptureRegion::from(region), CaptureRegion::Window);

        let region = RegionConfig { x: 10, y: 10, width: 800, height: 0 };
        assert_eq!(CaptureRegion::from(region), CaptureRegion::Window);
    }

    #[test]
    fn test_region_explicit_rect() {
        let region = RegionConfig { x: 10, y: 20, width: 800, height: 600 };
        assert_eq!(
            CaptureRegion::from(region),
            CaptureRegion::Rect { x: 10, y: 20, width: 800, height: 600 }
        );
    }

    #[tokio::test]
    async fn test_disabled_capture_fails() {
        let request = CaptureRequest {
            window_title: "MetaTrader 5".to_string(),
            region: CaptureRegion::Window,
            output: PathBuf::from("unused.png"),
        };
        assert!(matches!(
            DisabledCapture.capture(&request).await,
            Err(CaptureError::NotConfigured)
        ));
    }

    #[test]
    fn test_screenshot_path_naming() {
        let signal = signal_at("2024-01-15 09:30:05", "EURUSD", "OB", "London");
        let path = screenshot_path(Path::new("/journal/2024-01-15"), &signal);

        assert_eq!(
            path,
            PathBuf::from("/journal/2024-01-15/EURUSD_OB_London_09-30-05.png")
        );
    }
}
