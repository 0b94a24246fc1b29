pub mod signal_file;

pub use signal_file::{SignalFile, SourceError, SIGNAL_FILE_NAME};
