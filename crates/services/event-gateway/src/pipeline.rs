//! Ingest pipeline
//!
//! decode → count → dispatch → fan out. A decode failure stops the pipeline
//! before the counter, so rejected payloads are never counted, dispatched or
//! delivered. Fan-out runs in its own task that the caller awaits; dropping the
//! caller (client disconnect) does not cancel sink delivery.

use std::sync::Arc;

use nvr_events_core::{
    DecodeError, DispatchOutcome, Dispatcher, HikvisionDecoder, VendorDecoder, VendorEvent,
    VivotekDecoder,
};

use crate::counter::EventCounter;
use crate::sink::{FanOut, FanOutReport};

/// Result of one accepted event
#[derive(Debug, Clone)]
pub struct Ingested {
    pub event_id: u64,
    pub event: Arc<VendorEvent>,
    pub outcome: DispatchOutcome,
    pub report: FanOutReport,
}

/// Shared processing chain behind every ingest route
#[derive(Debug)]
pub struct EventPipeline {
    counter: Arc<EventCounter>,
    dispatcher: Dispatcher,
    fan_out: Arc<FanOut>,
    vivotek: VivotekDecoder,
    hikvision: HikvisionDecoder,
}

impl EventPipeline {
    pub fn new(dispatcher: Dispatcher, fan_out: FanOut) -> Self {
        Self {
            counter: Arc::new(EventCounter::new()),
            dispatcher,
            fan_out: Arc::new(fan_out),
            vivotek: VivotekDecoder::new(),
            hikvision: HikvisionDecoder::new(),
        }
    }

    pub fn counter(&self) -> &EventCounter {
        &self.counter
    }

    pub fn fan_out(&self) -> &FanOut {
        &self.fan_out
    }

    /// Canonical JSON body from a Vivotek NVR
    pub async fn ingest_vivotek(&self, body: &[u8]) -> Result<Ingested, DecodeError> {
        self.ingest(&self.vivotek, body).await
    }

    /// XML alarm body from a HIKVision device
    pub async fn ingest_hikvision(&self, body: &[u8]) -> Result<Ingested, DecodeError> {
        self.ingest(&self.hikvision, body).await
    }

    /// Run `body` through `decoder` and the rest of the chain
    pub async fn ingest(
        &self,
        decoder: &dyn VendorDecoder,
        body: &[u8],
    ) -> Result<Ingested, DecodeError> {
        let event = match decoder.decode(body) {
            Ok(event) => Arc::new(event),
            Err(e) => {
                tracing::warn!(vendor = %decoder.vendor(), error = %e, "Rejected malformed payload");
                tracing::debug!(
                    vendor = %decoder.vendor(),
                    "Raw payload: {}",
                    String::from_utf8_lossy(body)
                );
                return Err(e);
            }
        };

        let event_id = self.counter.next_id();
        let canonical = event.event();
        tracing::info!(
            event_id,
            vendor = %event.vendor(),
            event_type = %canonical.event_type,
            device_id = %canonical.device_id,
            channel_id = %canonical.channel_id,
            "Received {} event #{}",
            event.vendor(),
            event_id
        );

        let outcome = self.dispatcher.dispatch(&event);

        let fan_out = self.fan_out.clone();
        let delivery = tokio::spawn({
            let event = event.clone();
            async move { fan_out.deliver(event).await }
        });
        let report = match delivery.await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(event_id, error = %e, "Fan-out task aborted");
                FanOutReport::default()
            }
        };

        Ok(Ingested {
            event_id,
            event,
            outcome,
            report,
        })
    }
}
