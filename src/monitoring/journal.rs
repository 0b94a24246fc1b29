use chrono::NaiveDateTime;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use crate::signals::Signal;

pub const JOURNAL_FILE_NAME: &str = "trade_memory.csv";

const HEADER: [&str; 8] = [
    "datetime",
    "symbol",
    "strategy",
    "session",
    "screenshot_path",
    "status",
    "result_R",
    "notes",
];

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("Failed to create day folder {path}: {source}")]
    Folder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open journal {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write journal row: {0}")]
    Write(#[from] csv::Error),

    #[error("Failed to flush journal {path}: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Append-only CSV journal of accepted signals.
///
/// Rows go to `<folder>/trade_memory.csv`; screenshots live in per-day
/// folders `<folder>/<YYYY-MM-DD>/` next to it.
pub struct JournalWriter {
    folder: PathBuf,
}

impl JournalWriter {
    pub fn new(folder: PathBuf) -> Self {
        Self { folder }
    }

    pub fn journal_path(&self) -> PathBuf {
        self.folder.join(JOURNAL_FILE_NAME)
    }

    /// Day folder for a signal timestamp (not created)
    pub fn day_folder(&self, timestamp: NaiveDateTime) -> PathBuf {
        self.folder.join(timestamp.format("%Y-%m-%d").to_string())
    }

    /// Append one `pending` row for `signal`, writing the header first if
    /// the journal file is new. Returns the journal path.
    pub fn write_entry(
        &self,
        signal: &Signal,
        screenshot: Option<&Path>,
    ) -> Result<PathBuf, JournalError> {
        let day_folder = self.day_folder(signal.timestamp());
        fs::create_dir_all(&day_folder).map_err(|e| JournalError::Folder {
            path: day_folder.clone(),
            source: e,
        })?;

        let journal_path = self.journal_path();
        let is_new = !journal_path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&journal_path)
            .map_err(|e| JournalError::Open {
                path: journal_path.clone(),
                source: e,
            })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);

        if is_new {
            writer.write_record(HEADER)?;
        }

        let datetime = signal.timestamp().format("%Y-%m-%d %H:%M:%S").to_string();
        let screenshot = screenshot
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        writer.write_record([
            datetime.as_str(),
            signal.symbol(),
            signal.strategy(),
            signal.session(),
            screenshot.as_str(),
            "pending",
            "0",
            "",
        ])?;

        writer.flush().map_err(|e| JournalError::Flush {
            path: journal_path.clone(),
            source: e,
        })?;

        Ok(journal_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::types::signal_at;

    #[test]
    fn test_first_entry_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let journal = JournalWriter::new(dir.path().to_path_buf());
        let signal = signal_at("2024-01-15 09:30:00", "EURUSD", "OB", "London");

        let path = journal.write_entry(&signal, None).unwrap();
        assert_eq!(path, dir.path().join(JOURNAL_FILE_NAME));

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "datetime,symbol,strategy,session,screenshot_path,status,result_R,notes\n\
             2024-01-15 09:30:00,EURUSD,OB,London,,pending,0,\n"
        );
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let journal = JournalWriter::new(dir.path().to_path_buf());

        journal
            .write_entry(&signal_at("2024-01-15 09:30:00", "EURUSD", "OB", "London"), None)
            .unwrap();
        journal
            .write_entry(&signal_at("2024-01-15 10:00:00", "GBPUSD", "FVG", "London"), None)
            .unwrap();

        let contents = fs::read_to_string(journal.journal_path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("datetime,"));
        assert!(lines[2].starts_with("2024-01-15 10:00:00,GBPUSD,FVG,London,"));
    }

    #[test]
    fn test_screenshot_path_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let journal = JournalWriter::new(dir.path().to_path_buf());
        let signal = signal_at("2024-01-15 09:30:00", "EURUSD", "OB", "London");
        let shot = journal.day_folder(signal.timestamp()).join("EURUSD_OB_London_09-30-00.png");

        journal.write_entry(&signal, Some(shot.as_path())).unwrap();

        let contents = fs::read_to_string(journal.journal_path()).unwrap();
        let row = contents.lines().nth(1).unwrap();
        assert_eq!(
            row,
            format!("2024-01-15 09:30:00,EURUSD,OB,London,{},pending,0,", shot.display())
        );
    }

    #[test]
    fn test_day_folder_created() {
        let dir = tempfile::tempdir().unwrap();
        let journal = JournalWriter::new(dir.path().to_path_buf());
        let signal = signal_at("2024-02-29 23:59:59", "US30", "BOS", "");

        journal.write_entry(&signal, None).unwrap();
        assert!(dir.path().join("2024-02-29").is_dir());
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let journal = JournalWriter::new(dir.path().to_path_buf());
        let signal = signal_at("2024-01-15 09:30:00", "EURUSD", "OB", "London, late");

        journal.write_entry(&signal, None).unwrap();

        let mut reader = csv::Reader::from_path(journal.journal_path()).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[3], "London, late");
        assert_eq!(&record[5], "pending");
    }

    #[test]
    fn test_missing_folder_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let journal = JournalWriter::new(blocker);
        let err = journal
            .write_entry(&signal_at("2024-01-15 09:30:00", "EURUSD", "OB", ""), None)
            .unwrap_err();
        assert!(matches!(err, JournalError::Folder { .. }));
    }
}
