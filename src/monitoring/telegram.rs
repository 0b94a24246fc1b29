use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use crate::config::TelegramConfig;
use crate::signals::Signal;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Photo,
    Text,
    /// No credentials configured; nothing was sent
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Telegram {method} request failed: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Telegram {method} failed: {status} {body}")]
    Api {
        method: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to read screenshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Tells the operator about an accepted signal
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends the screenshot with the caption when it exists on disk,
    /// otherwise the caption alone
    async fn notify(
        &self,
        signal: &Signal,
        screenshot: Option<&Path>,
    ) -> Result<NotifyOutcome, NotifyError>;
}

/// `⚠ New Setup: EURUSD – OB – London – 09:30`
pub fn caption(signal: &Signal) -> String {
    format!(
        "\u{26a0} New Setup: {} \u{2013} {} \u{2013} {} \u{2013} {}",
        signal.symbol(),
        signal.strategy(),
        signal.session(),
        signal.timestamp().format("%H:%M"),
    )
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifyError> {
        Self::with_base_url(config, TELEGRAM_API_URL)
    }

    pub fn with_base_url(config: &TelegramConfig, base_url: &str) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(NotifyError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.trim().to_string(),
            chat_id: config.chat_id.trim().to_string(),
        })
    }

    fn has_credentials(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.bot_token, method)
    }

    async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        const METHOD: &str = "sendMessage";

        let response = self
            .client
            .post(self.method_url(METHOD))
            .form(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .await
            .map_err(|e| NotifyError::Transport { method: METHOD, source: e })?;

        check_response(METHOD, response).await
    }

    async fn send_photo(&self, caption: &str, screenshot: &Path) -> Result<(), NotifyError> {
        const METHOD: &str = "sendPhoto";

        let bytes = tokio::fs::read(screenshot).await.map_err(|e| NotifyError::Io {
            path: screenshot.display().to_string(),
            source: e,
        })?;
        let file_name = screenshot
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "screenshot.png".to_string());

        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .part("photo", Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(self.method_url(METHOD))
            .multipart(form)
            .send()
            .await
            .map_err(|e| NotifyError::Transport { method: METHOD, source: e })?;

        check_response(METHOD, response).await
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(
        &self,
        signal: &Signal,
        screenshot: Option<&Path>,
    ) -> Result<NotifyOutcome, NotifyError> {
        if !self.has_credentials() {
            warn!("Telegram credentials missing. Skipping notification.");
            return Ok(NotifyOutcome::Skipped);
        }

        let caption = caption(signal);
        match existing_screenshot(screenshot).await {
            Some(path) => {
                self.send_photo(&caption, path).await?;
                info!("Telegram photo sent for {}", signal.key_label());
                Ok(NotifyOutcome::Photo)
            }
            None => {
                self.send_message(&caption).await?;
                info!("Telegram message sent for {}", signal.key_label());
                Ok(NotifyOutcome::Text)
            }
        }
    }
}

async fn existing_screenshot(screenshot: Option<&Path>) -> Option<&Path> {
    let path = screenshot?;
    if path.as_os_str().is_empty() {
        return None;
    }
    match tokio::fs::try_exists(path).await {
        Ok(true) => Some(path),
        _ => None,
    }
}

async fn check_response(
    method: &'static str,
    response: reqwest::Response,
) -> Result<(), NotifyError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| NotifyError::Transport { method, source: e })?;

    if !status.is_success() {
        return Err(NotifyError::Api {
            method,
            status: status.as_u16(),
            body,
        });
    }

    // A 200 with `ok: false` is still a failure
    match serde_json::from_str::<TelegramResponse>(&body) {
        Ok(payload) if !payload.ok => Err(NotifyError::Api {
            method,
            status: status.as_u16(),
            body: payload.description.unwrap_or(body),
        }),
        _ => Ok(()),
    }
}
