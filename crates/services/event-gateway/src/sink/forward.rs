//! Forward sink
//!
//! POSTs the canonical event as JSON to the configured notification URL.
//! One attempt per event: a network error or non-2xx status is reported to
//! the fan-out, which logs it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{Sink, SinkError};
use nvr_events_core::VendorEvent;

const USER_AGENT: &str = concat!("nvr-event-gateway/", env!("CARGO_PKG_VERSION"));

/// Webhook forwarder for canonical events
pub struct ForwardSink {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl ForwardSink {
    /// Create a forwarder for `url` with a client-side request timeout
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SinkError> {
        let url = Url::parse(url).map_err(|e| SinkError::Endpoint(format!("{}: {}", url, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Sink for ForwardSink {
    fn name(&self) -> &'static str {
        "forward"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn deliver(&self, event: &VendorEvent) -> Result<(), SinkError> {
        let body = serde_json::to_vec(event.event())?;

        let response = self
            .client
            .post(self.url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            url = %self.url,
            vendor = %event.vendor(),
            event_type = %event.event_type(),
            status = status.as_u16(),
            "Event forwarded"
        );
        Ok(())
    }
}
