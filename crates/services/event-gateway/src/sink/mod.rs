//! Fan-out sinks
//!
//! A [`Sink`] is a best-effort downstream target for decoded events. The
//! [`FanOut`] runs every configured sink one after another; each delivery runs
//! in its own task under its own timeout, so an error, timeout or panic in one
//! sink is logged and then ignored. Nothing a sink does can change the HTTP
//! response or stop the next sink from running.

mod forward;
mod message;
mod telegram;

pub use forward::ForwardSink;
pub use message::format_message;
pub use telegram::TelegramSink;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use nvr_events_core::VendorEvent;

use crate::config::Config;

/// Delivery failure. Logged by the fan-out, never returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid endpoint: {0}")]
    Endpoint(String),
}

/// Downstream delivery target
#[async_trait]
pub trait Sink: Send + Sync {
    /// Short name used in logs and reports
    fn name(&self) -> &'static str;

    /// Upper bound for one delivery
    fn timeout(&self) -> Duration;

    /// Deliver one event
    async fn deliver(&self, event: &VendorEvent) -> Result<(), SinkError>;
}

/// Result of one sink delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    Delivered,
    Failed(String),
    TimedOut,
    Panicked,
}

impl SinkOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SinkOutcome::Delivered)
    }
}

/// Per-sink outcomes for one event, in delivery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub outcomes: Vec<(&'static str, SinkOutcome)>,
}

impl FanOutReport {
    pub fn outcome(&self, sink: &str) -> Option<&SinkOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| *name == sink)
            .map(|(_, outcome)| outcome)
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| !o.is_delivered()).count()
    }
}

/// Ordered set of independent sinks
#[derive(Clone, Default)]
pub struct FanOut {
    sinks: Vec<Arc<dyn Sink>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sinks enabled by `config`: forward when `notify_url` is set, then
    /// Telegram when enabled with a token and chat id
    pub fn from_config(config: &Config) -> Result<Self, SinkError> {
        let mut fan_out = Self::new();

        if let Some(url) = config.forward_url() {
            fan_out.push(ForwardSink::new(
                url,
                Duration::from_secs(config.forward_timeout_seconds),
            )?);
        }

        if config.telegram_configured() {
            fan_out.push(TelegramSink::new(
                &config.telegram_api_base,
                &config.telegram_token,
                &config.telegram_chat_id,
                Duration::from_secs(config.telegram_timeout_seconds),
            )?);
        }

        Ok(fan_out)
    }

    pub fn push<S: Sink + 'static>(&mut self, sink: S) -> &mut Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Attempt every sink in order; never fails
    pub async fn deliver(&self, event: Arc<VendorEvent>) -> FanOutReport {
        let mut report = FanOutReport::default();

        for sink in &self.sinks {
            let outcome = Self::deliver_one(sink.clone(), event.clone()).await;
            report.outcomes.push((sink.name(), outcome));
        }

        report
    }

    async fn deliver_one(sink: Arc<dyn Sink>, event: Arc<VendorEvent>) -> SinkOutcome {
        let name = sink.name();
        let limit = sink.timeout();
        let start = Instant::now();

        let task = tokio::spawn({
            let event = event.clone();
            async move { tokio::time::timeout(limit, sink.deliver(&event)).await }
        });

        let outcome = match task.await {
            Ok(Ok(Ok(()))) => SinkOutcome::Delivered,
            Ok(Ok(Err(e))) => SinkOutcome::Failed(e.to_string()),
            Ok(Err(_elapsed)) => SinkOutcome::TimedOut,
            Err(join_error) => {
                tracing::error!(sink = name, error = %join_error, "Sink task aborted");
                SinkOutcome::Panicked
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            SinkOutcome::Delivered => tracing::debug!(
                sink = name,
                vendor = %event.vendor(),
                event_type = %event.event_type(),
                duration_ms = duration_ms,
                "Sink delivery succeeded"
            ),
            SinkOutcome::Failed(error) => tracing::warn!(
                sink = name,
                vendor = %event.vendor(),
                event_type = %event.event_type(),
                error = %error,
                duration_ms = duration_ms,
                "Sink delivery failed"
            ),
            SinkOutcome::TimedOut => tracing::warn!(
                sink = name,
                vendor = %event.vendor(),
                event_type = %event.event_type(),
                timeout_ms = limit.as_millis() as u64,
                "Sink delivery timed out"
            ),
            SinkOutcome::Panicked => {}
        }

        outcome
    }
}

impl std::fmt::Debug for FanOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOut")
            .field("sinks", &self.sink_names())
            .finish()
    }
}
