//! Canonical event model
//!
//! Every vendor payload is decoded into a [`CanonicalEvent`]. The vendor it
//! came from travels next to it in [`VendorEvent`] and never appears on the
//! wire.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form, vendor-specific event payload
pub type EventDetails = serde_json::Map<String, serde_json::Value>;

/// Prefix of the escape tag used for vendor types the normalizer cannot map
pub const UNKNOWN_EVENT_PREFIX: &str = "UnknownEvent_";

/// Canonical event tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    MotionDetection,
    VideoLoss,
    DeviceConnection,
    TamperDetection,
    StorageFailure,
    LineCrossing,
    IntrusionDetection,
    FaceDetection,
    #[serde(rename = "IOAlarm")]
    IoAlarm,
}

impl EventKind {
    /// Every canonical tag
    pub const ALL: [EventKind; 9] = [
        EventKind::MotionDetection,
        EventKind::VideoLoss,
        EventKind::DeviceConnection,
        EventKind::TamperDetection,
        EventKind::StorageFailure,
        EventKind::LineCrossing,
        EventKind::IntrusionDetection,
        EventKind::FaceDetection,
        EventKind::IoAlarm,
    ];

    /// Wire name of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::MotionDetection => "MotionDetection",
            EventKind::VideoLoss => "VideoLoss",
            EventKind::DeviceConnection => "DeviceConnection",
            EventKind::TamperDetection => "TamperDetection",
            EventKind::StorageFailure => "StorageFailure",
            EventKind::LineCrossing => "LineCrossing",
            EventKind::IntrusionDetection => "IntrusionDetection",
            EventKind::FaceDetection => "FaceDetection",
            EventKind::IoAlarm => "IOAlarm",
        }
    }

    /// Look up a tag by its exact (case-sensitive) wire name
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event type as carried by a canonical event.
///
/// Serializes to exactly the string it was parsed from, so a JSON vendor
/// event survives a decode/encode round trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    /// One of the canonical tags
    Known(EventKind),

    /// `UnknownEvent_<raw>`: a vendor type the normalizer could not map
    Unknown(String),

    /// A vendor-reported string outside the canonical set, kept verbatim
    Other(String),
}

impl EventType {
    /// Canonical tag, if this is one
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            EventType::Known(kind) => Some(*kind),
            _ => None,
        }
    }

    /// True only for an empty verbatim type; the other forms always render non-empty
    pub fn is_empty(&self) -> bool {
        matches!(self, EventType::Other(raw) if raw.is_empty())
    }
}

impl From<EventKind> for EventType {
    fn from(kind: EventKind) -> Self {
        EventType::Known(kind)
    }
}

impl From<String> for EventType {
    fn from(raw: String) -> Self {
        if let Some(kind) = EventKind::from_tag(&raw) {
            return EventType::Known(kind);
        }
        match raw.strip_prefix(UNKNOWN_EVENT_PREFIX) {
            Some(rest) => EventType::Unknown(rest.to_string()),
            None => EventType::Other(raw),
        }
    }
}

impl From<&str> for EventType {
    fn from(raw: &str) -> Self {
        EventType::from(raw.to_string())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Known(kind) => f.write_str(kind.as_str()),
            EventType::Unknown(raw) => write!(f, "{}{}", UNKNOWN_EVENT_PREFIX, raw),
            EventType::Other(raw) => f.write_str(raw),
        }
    }
}

impl PartialEq<EventKind> for EventType {
    fn eq(&self, other: &EventKind) -> bool {
        self.kind() == Some(*other)
    }
}

/// Vendor-neutral event record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEvent {
    pub event_type: EventType,
    pub event_time: DateTime<Utc>,
    pub device_id: String,
    pub channel_id: String,
    pub event_details: EventDetails,
}

impl CanonicalEvent {
    /// String detail value, if present and a string
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.event_details.get(key).and_then(|v| v.as_str())
    }
}

/// Device family an event was received from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    /// JSON protocol (`/event`, `/events`)
    Vivotek,
    /// XML protocol (`/hikvision/alarm`)
    Hikvision,
}

impl Vendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Vivotek => "Vivotek",
            Vendor::Hikvision => "HIKVision",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HIKVision event plus the raw XML it was converted from
#[derive(Debug, Clone, PartialEq)]
pub struct HikvisionEvent {
    pub event: CanonicalEvent,
    /// Kept for diagnostic logging only
    pub raw_xml: String,
}

/// A canonical event tagged with its originating vendor
#[derive(Debug, Clone, PartialEq)]
pub enum VendorEvent {
    Vivotek(CanonicalEvent),
    Hikvision(HikvisionEvent),
}

impl VendorEvent {
    pub fn vendor(&self) -> Vendor {
        match self {
            VendorEvent::Vivotek(_) => Vendor::Vivotek,
            VendorEvent::Hikvision(_) => Vendor::Hikvision,
        }
    }

    pub fn event(&self) -> &CanonicalEvent {
        match self {
            VendorEvent::Vivotek(event) => event,
            VendorEvent::Hikvision(hik) => &hik.event,
        }
    }

    pub fn event_type(&self) -> &EventType {
        &self.event().event_type
    }
}
