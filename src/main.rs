use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use signal_relay::capture::{CaptureError, CommandCapture, DisabledCapture, ScreenCapture};
use signal_relay::config::{Config, EnvConfig};
use signal_relay::data::SignalFile;
use signal_relay::execution::{Pipeline, Relay, Sleeper, TokioSleeper};
use signal_relay::monitoring::{self, JournalWriter, TelegramNotifier};
use signal_relay::signals::Deduplicator;

#[derive(Debug, Parser)]
#[command(name = "signal-relay", about = "Relay terminal signals to the journal and Telegram")]
struct Cli {
    /// Path to the TOML config file
    #[arg(default_value = "config.toml")]
    config: String,

    /// File that receives a copy of all log output
    #[arg(long, default_value = "helper_log.txt")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = monitoring::logging::init(&cli.log_file)?;

    if let Err(e) = run(cli).await {
        tracing::error!("Fatal error: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    tracing::info!("Signal relay starting...");

    // Load configuration
    let mut config = Config::load(&cli.config)?;
    config.apply_env(EnvConfig::load());
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", cli.config))?;

    tracing::info!("Signals folder: {}", config.relay.signals_folder.display());
    tracing::info!("Journal folder: {}", config.relay.journal_folder.display());
    tracing::info!("Poll interval: {}s", config.relay.poll_interval_secs);
    tracing::info!("Duplicate window: {} min", config.relay.duplicate_minutes);
    tracing::info!("Capture window: {}", config.capture.window_title);
    tracing::info!("Telegram credentials present: {}", config.telegram_credentials_present());

    let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);

    let capture: Box<dyn ScreenCapture> = match CommandCapture::new(&config.capture.command) {
        Ok(capture) => Box::new(capture),
        Err(CaptureError::NotConfigured) => {
            tracing::warn!("No capture command configured; signals will be sent without screenshots");
            Box::new(DisabledCapture)
        }
        Err(e) => return Err(e.into()),
    };

    let notifier = TelegramNotifier::new(&config.telegram)?;

    let pipeline = Pipeline::new(
        capture,
        JournalWriter::new(config.relay.journal_folder.clone()),
        Box::new(notifier),
        sleeper.clone(),
    )
    .with_settle_delay(Duration::from_secs(config.capture.delay_secs))
    .with_target(config.capture.window_title.clone(), config.capture.region.into());

    let mut relay = Relay::new(
        SignalFile::in_folder(&config.relay.signals_folder),
        Deduplicator::with_cooldown_minutes(config.relay.duplicate_minutes),
        pipeline,
        sleeper,
        Duration::from_secs(config.relay.poll_interval_secs),
    );

    tracing::info!("Configuration loaded. Starting helper loop...");

    tokio::select! {
        _ = relay.run() => {}
        res = tokio::signal::ctrl_c() => {
            res?;
            tracing::info!("Shutting down...");
        }
    }

    Ok(())
}
