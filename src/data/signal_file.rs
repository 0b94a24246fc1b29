use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// File the terminal rewrites on every new signal
pub const SIGNAL_FILE_NAME: &str = "latest_signal.txt";

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to stat signal file {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read signal file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Watches the signal file by modification time.
///
/// The marker moves forward as soon as a newer write is seen, before the
/// content is read, so a rewrite that cannot be read or parsed is only
/// retried after the terminal writes the file again.
pub struct SignalFile {
    path: PathBuf,
    last_write: Option<SystemTime>,
}

impl SignalFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            last_write: None,
        }
    }

    /// `<signals_folder>/latest_signal.txt`
    pub fn in_folder(folder: &Path) -> Self {
        Self::new(folder.join(SIGNAL_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_write(&self) -> Option<SystemTime> {
        self.last_write
    }

    /// Returns the file's lines when it changed since the last poll
    pub async fn poll(&mut self) -> Result<Option<Vec<String>>, SourceError> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SourceError::Metadata {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let modified = metadata.modified().map_err(|e| SourceError::Metadata {
            path: self.path.clone(),
            source: e,
        })?;

        if self.last_write.is_some_and(|seen| modified <= seen) {
            return Ok(None);
        }

        self.last_write = Some(modified);
        debug!("Signal file changed: {}", self.path.display());

        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| SourceError::Read {
                path: self.path.clone(),
                source: e,
            })?;

        // Terminals may write ANSI text; bad bytes become U+FFFD
        let contents = String::from_utf8_lossy(&bytes);
        Ok(Some(contents.lines().map(str::to_string).collect()))
    }
}
