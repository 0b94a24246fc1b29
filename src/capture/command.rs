use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;
use crate::capture::{CaptureError, CaptureRegion, CaptureRequest, ScreenCapture};

/// Delegates the grab to an external screenshot tool.
///
/// Each configured argument may contain the placeholders `{window}`,
/// `{output}`, `{mode}` (`window` or `region`), `{x}`, `{y}`, `{width}` and
/// `{height}`. Whole-window captures expand the geometry placeholders to `0`.
/// The tool is expected to write the image to `{output}` and exit 0; a
/// missing window is reported through a non-zero exit and stderr.
pub struct CommandCapture {
    program: String,
    args: Vec<String>,
}

impl CommandCapture {
    pub fn new(command: &[String]) -> Result<Self, CaptureError> {
        let (program, args) = command.split_first().ok_or(CaptureError::NotConfigured)?;
        if program.trim().is_empty() {
            return Err(CaptureError::NotConfigured);
        }

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn expand_args(&self, request: &CaptureRequest) -> Vec<String> {
        let (mode, x, y, width, height) = match request.region {
            CaptureRegion::Window => ("window", 0, 0, 0, 0),
            CaptureRegion::Rect { x, y, width, height } => ("region", x, y, width, height),
        };
        let output = request.output.display().to_string();

        self.args
            .iter()
            .map(|arg| {
                arg.replace("{window}", &request.window_title)
                    .replace("{output}", &output)
                    .replace("{mode}", mode)
                    .replace("{x}", &x.to_string())
                    .replace("{y}", &y.to_string())
                    .replace("{width}", &width.to_string())
                    .replace("{height}", &height.to_string())
            })
            .collect()
    }
}

#[async_trait]
impl ScreenCapture for CommandCapture {
    async fn capture(&self, request: &CaptureRequest) -> Result<PathBuf, CaptureError> {
        // A leftover image must not pass for this grab's output
        match tokio::fs::remove_file(&request.output).await {
            Ok(()) => debug!("Removed stale screenshot {}", request.output.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CaptureError::Stale {
                    path: request.output.clone(),
                    source: e,
                })
            }
        }

        let args = self.expand_args(request);
        debug!("Running capture command: {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CaptureError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(CaptureError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !tokio::fs::try_exists(&request.output).await.unwrap_or(false) {
            return Err(CaptureError::NoOutput(request.output.clone()));
        }

        Ok(request.output.clone())
    }
}
