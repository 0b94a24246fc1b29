use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use crate::data::{SignalFile, SourceError};
use crate::execution::clock::Sleeper;
use crate::execution::pipeline::{Pipeline, PipelineReport};
use crate::signals::{parse_signal, DedupDecision, Deduplicator, ParseError, Signal};

/// Result of one poll iteration
#[derive(Debug)]
pub enum TickOutcome {
    /// File absent or not rewritten since the last poll
    Unchanged,
    Rejected(ParseError),
    Duplicate(Signal),
    Processed(Signal, PipelineReport),
}

/// Poll loop: signal file → parser → deduplicator → pipeline.
///
/// Iterations never overlap; the next poll starts only after the previous
/// pipeline run (settle delay included) has finished.
pub struct Relay {
    source: SignalFile,
    dedup: Deduplicator,
    pipeline: Pipeline,
    sleeper: Arc<dyn Sleeper>,
    poll_interval: Duration,
}

impl Relay {
    pub fn new(
        source: SignalFile,
        dedup: Deduplicator,
        pipeline: Pipeline,
        sleeper: Arc<dyn Sleeper>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            dedup,
            pipeline,
            sleeper,
            poll_interval,
        }
    }

    pub fn deduplicator(&self) -> &Deduplicator {
        &self.dedup
    }

    /// Poll forever. Errors from one iteration are logged and the loop
    /// carries on.
    pub async fn run(&mut self) {
        info!("Helper loop started.");
        loop {
            self.run_once().await;
        }
    }

    /// One guarded iteration followed by the poll interval wait
    pub async fn run_once(&mut self) {
        if let Err(e) = self.tick().await {
            error!("Processing error: {}", e);
        }
        self.sleeper.sleep(self.poll_interval).await;
    }

    pub async fn tick(&mut self) -> Result<TickOutcome, SourceError> {
        let Some(lines) = self.source.poll().await? else {
            return Ok(TickOutcome::Unchanged);
        };

        let signal = match parse_signal(&lines) {
            Ok(signal) => signal,
            Err(e) => {
                warn!(
                    "{} exists but could not be parsed: {}",
                    self.source.path().display(),
                    e
                );
                return Ok(TickOutcome::Rejected(e));
            }
        };

        if let DedupDecision::Duplicate { .. } = self.dedup.check(&signal) {
            return Ok(TickOutcome::Duplicate(signal));
        }

        info!(
            "New signal detected: {} {} {}",
            signal.symbol(),
            signal.strategy(),
            signal.session()
        );
        let report = self.pipeline.run(&signal).await;

        Ok(TickOutcome::Processed(signal, report))
    }
}
