use chrono::NaiveDateTime;
use std::collections::HashMap;
use crate::signals::types::Signal;

/// Accepted timestamp layouts, tried in order
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y.%m.%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("signal content is empty")]
    Empty,

    #[error("required field missing or empty: {0}")]
    MissingField(&'static str),

    #[error("unrecognised timestamp: {0:?}")]
    InvalidTimestamp(String),
}

/// Parse the `key = value` lines of a signal file into a [`Signal`].
///
/// Lines without `=` are skipped. Keys are case-insensitive and a later
/// duplicate key replaces an earlier one.
pub fn parse_signal<S: AsRef<str>>(lines: &[S]) -> Result<Signal, ParseError> {
    if lines.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut fields: HashMap<String, String> = HashMap::new();
    for (idx, line) in lines.iter().enumerate() {
        let mut line = line.as_ref();
        if idx == 0 {
            line = line.trim_start_matches('\u{feff}');
        }

        if let Some((key, value)) = line.split_once('=') {
            fields.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    let raw_timestamp = required(&mut fields, "timestamp")?;
    let symbol = required(&mut fields, "symbol")?;
    let strategy = required(&mut fields, "strategy")?;
    let session = fields.remove("session").unwrap_or_default();

    let timestamp = parse_timestamp(&raw_timestamp)
        .ok_or(ParseError::InvalidTimestamp(raw_timestamp))?;

    Ok(Signal::new(timestamp, symbol, strategy, session))
}

fn required(
    fields: &mut HashMap<String, String>,
    name: &'static str,
) -> Result<String, ParseError> {
    match fields.remove(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ParseError::MissingField(name)),
    }
}

/// Fixed-width `YYYY?MM?DD HH:MM:SS`; chrono alone would take `2024.1.5 9:30:00`
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let fixed_width = raw.len() == 19
        && raw
            .bytes()
            .enumerate()
            .all(|(i, b)| matches!(i, 4 | 7 | 10 | 13 | 16) || b.is_ascii_digit());
    if !fixed_width {
        return None;
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
