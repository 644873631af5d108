//! Telegram sink
//!
//! Sends a formatted HTML message through the Bot API `sendMessage` method.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{format_message, Sink, SinkError};
use nvr_events_core::VendorEvent;

/// Telegram Bot API notifier
pub struct TelegramSink {
    client: Client,
    endpoint: Url,
    chat_id: String,
    timeout: Duration,
}

impl TelegramSink {
    /// Create a notifier posting to `{api_base}/bot{token}/sendMessage`
    pub fn new(
        api_base: &str,
        token: &str,
        chat_id: &str,
        timeout: Duration,
    ) -> Result<Self, SinkError> {
        let raw = format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), token);
        // The token is part of the path; keep it out of the error text.
        let endpoint = Url::parse(&raw)
            .map_err(|e| SinkError::Endpoint(format!("telegram api base {}: {}", api_base, e)))?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            chat_id: chat_id.to_string(),
            timeout,
        })
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

#[async_trait]
impl Sink for TelegramSink {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn deliver(&self, event: &VendorEvent) -> Result<(), SinkError> {
        let text = format_message(event);
        let form = [
            ("chat_id", self.chat_id.as_str()),
            ("text", text.as_str()),
            ("parse_mode", "HTML"),
        ];

        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(
            "Telegram notification sent successfully for {} event type {}",
            event.vendor(),
            event.event_type()
        );
        Ok(())
    }
}
