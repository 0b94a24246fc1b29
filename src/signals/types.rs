use chrono::NaiveDateTime;

/// One trading event emitted by the terminal.
///
/// The timestamp is local wall-clock time as written by the terminal; no
/// timezone conversion is applied anywhere in the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    timestamp: NaiveDateTime,
    symbol: String,
    strategy: String,
    session: String,
}

impl Signal {
    pub(crate) fn new(
        timestamp: NaiveDateTime,
        symbol: String,
        strategy: String,
        session: String,
    ) -> Self {
        Self {
            timestamp,
            symbol,
            strategy,
            session,
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    /// `SYMBOL|STRATEGY`, used in log lines
    pub fn key_label(&self) -> String {
        format!("{}|{}", self.symbol, self.strategy)
    }
}

#[cfg(test)]
pub(crate) fn signal_at(ts: &str, symbol: &str, strategy: &str, session: &str) -> Signal {
    let timestamp = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap();
    Signal::new(
        timestamp,
        symbol.to_string(),
        strategy.to_string(),
        session.to_string(),
    )
}
