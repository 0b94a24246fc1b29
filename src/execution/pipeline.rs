use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use crate::capture::{screenshot_path, CaptureError, CaptureRegion, CaptureRequest, ScreenCapture};
use crate::execution::clock::Sleeper;
use crate::monitoring::journal::{JournalError, JournalWriter};
use crate::monitoring::telegram::{NotifyError, NotifyOutcome, Notifier};
use crate::signals::Signal;

/// What each stage did for one accepted signal
#[derive(Debug)]
pub struct PipelineReport {
    pub capture: Result<PathBuf, CaptureError>,
    pub journal: Result<PathBuf, JournalError>,
    pub notify: Result<NotifyOutcome, NotifyError>,
}

impl PipelineReport {
    pub fn screenshot(&self) -> Option<&Path> {
        self.capture.as_ref().ok().map(PathBuf::as_path)
    }

    pub fn is_clean(&self) -> bool {
        self.capture.is_ok() && self.journal.is_ok() && self.notify.is_ok()
    }
}

/// Runs capture, journal and notify for an accepted signal.
///
/// The stages run in that order and each one is attempted no matter how
/// the previous ones went. A failed capture leaves later stages without a
/// screenshot.
pub struct Pipeline {
    capture: Box<dyn ScreenCapture>,
    journal: JournalWriter,
    notifier: Box<dyn Notifier>,
    sleeper: Arc<dyn Sleeper>,
    settle_delay: Duration,
    window_title: String,
    region: CaptureRegion,
}

impl Pipeline {
    pub fn new(
        capture: Box<dyn ScreenCapture>,
        journal: JournalWriter,
        notifier: Box<dyn Notifier>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            capture,
            journal,
            notifier,
            sleeper,
            settle_delay: Duration::ZERO,
            window_title: String::new(),
            region: CaptureRegion::Window,
        }
    }

    /// Pause before grabbing the screen so the terminal can redraw
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_target(mut self, window_title: String, region: CaptureRegion) -> Self {
        self.window_title = window_title;
        self.region = region;
        self
    }

    pub async fn run(&self, signal: &Signal) -> PipelineReport {
        self.sleeper.sleep(self.settle_delay).await;

        let capture = self.capture_stage(signal).await;
        match &capture {
            Ok(path) => info!("Screenshot saved to {}", path.display()),
            Err(e) => error!("Screenshot failed: {}", e),
        }
        let screenshot = capture.as_ref().ok().map(PathBuf::as_path);

        let journal = self.journal.write_entry(signal, screenshot);
        match &journal {
            Ok(path) => info!("Journal updated: {}", path.display()),
            Err(e) => error!("Journal update failed: {}", e),
        }

        let notify = self.notifier.notify(signal, screenshot).await;
        if let Err(e) = &notify {
            error!("Telegram notification failed: {}", e);
        }

        PipelineReport {
            capture,
            journal,
            notify,
        }
    }

    async fn capture_stage(&self, signal: &Signal) -> Result<PathBuf, CaptureError> {
        let day_folder = self.journal.day_folder(signal.timestamp());
        tokio::fs::create_dir_all(&day_folder)
            .await
            .map_err(|e| CaptureError::Folder {
                path: day_folder.clone(),
                source: e,
            })?;

        let request = CaptureRequest {
            window_title: self.window_title.clone(),
            region: self.region,
            output: screenshot_path(&day_folder, signal),
        };

        self.capture.capture(&request).await
    }
}
