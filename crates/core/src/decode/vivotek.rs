//! JSON (Vivotek) decoder
//!
//! The JSON vendor already posts canonical-shaped events, so decoding is a
//! straight deserialization plus the non-empty type check.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::VendorDecoder;
use crate::error::{DecodeError, Result};
use crate::event::{CanonicalEvent, EventDetails, EventType, Vendor, VendorEvent};

/// Wire form of a JSON vendor event; only `eventType` is mandatory
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VivotekPayload {
    #[serde(default)]
    event_type: Option<String>,
    #[serde(default)]
    event_time: Option<DateTime<Utc>>,
    #[serde(default)]
    device_id: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    event_details: Option<EventDetails>,
}

/// Decoder for `/event` and `/events` bodies
#[derive(Debug, Clone, Copy)]
pub struct VivotekDecoder {
    clock: fn() -> DateTime<Utc>,
}

impl VivotekDecoder {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Use `clock` as the receive time for events without `eventTime`
    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        Self { clock }
    }

    /// Decode a body into a canonical event
    pub fn decode_event(&self, body: &[u8]) -> Result<CanonicalEvent> {
        let payload: VivotekPayload = serde_json::from_slice(body)?;

        let event_type = match payload.event_type {
            Some(raw) if !raw.is_empty() => EventType::from(raw),
            _ => return Err(DecodeError::MissingEventType),
        };

        Ok(CanonicalEvent {
            event_type,
            event_time: payload.event_time.unwrap_or_else(self.clock),
            device_id: payload.device_id,
            channel_id: payload.channel_id,
            event_details: payload.event_details.unwrap_or_default(),
        })
    }
}

impl Default for VivotekDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl VendorDecoder for VivotekDecoder {
    fn vendor(&self) -> Vendor {
        Vendor::Vivotek
    }

    fn decode(&self, body: &[u8]) -> Result<VendorEvent> {
        self.decode_event(body).map(VendorEvent::Vivotek)
    }
}
