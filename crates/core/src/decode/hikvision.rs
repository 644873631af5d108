//! XML (HIKVision) decoder
//!
//! HIKVision cameras and NVRs push `<EventNotificationAlert>` documents to an
//! "alarm server" endpoint. The document is parsed into [`HikvisionAlarm`]
//! and then converted into a canonical event:
//!
//! - `dateTime` is parsed as RFC3339 with a numeric offset, then as UTC with
//!   a literal `Z`, and finally replaced by the decoder clock. A bad timestamp
//!   never rejects the alarm.
//! - The device id is `HIK_` followed by the MAC address without colons, or
//!   by the IP address when no MAC is reported.
//! - The channel id is `Channel<channelID>`.
//! - The event type goes through [`TypeNormalizer`].

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Deserializer};

use super::VendorDecoder;
use crate::error::{DecodeError, Result};
use crate::event::{CanonicalEvent, EventDetails, HikvisionEvent, Vendor, VendorEvent};
use crate::normalize::TypeNormalizer;

/// Prefix of every HIKVision device id
pub const DEVICE_ID_PREFIX: &str = "HIK_";

const ROOT_ELEMENT: &[u8] = b"EventNotificationAlert";
const CHANNEL_ID_PREFIX: &str = "Channel";
const SOURCE: &str = "HIKVision";

const OFFSET_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";
const UTC_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Raw `<EventNotificationAlert>` fields. Unknown child elements are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HikvisionAlarm {
    #[serde(rename = "ipAddress")]
    pub ip_address: String,

    #[serde(rename = "portNo", deserialize_with = "xml_int")]
    pub port_no: i64,

    #[serde(rename = "protocolType")]
    pub protocol_type: String,

    #[serde(rename = "macAddress")]
    pub mac_address: String,

    #[serde(rename = "channelID", deserialize_with = "xml_int")]
    pub channel_id: i64,

    #[serde(rename = "dateTime")]
    pub date_time: String,

    #[serde(rename = "activePostCount", deserialize_with = "xml_int")]
    pub active_post_count: i64,

    #[serde(rename = "eventType")]
    pub event_type: String,

    #[serde(rename = "eventState")]
    pub event_state: String,

    #[serde(rename = "eventDescription")]
    pub event_description: String,

    #[serde(rename = "detectionRegionID", deserialize_with = "xml_int")]
    pub detection_region_id: i64,
}

/// Integer element text; surrounding whitespace is ignored and an empty element reads as 0
fn xml_int<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse().map_err(serde::de::Error::custom)
}

impl HikvisionAlarm {
    /// Parse an alarm document, checking the root element first
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event()? {
                Event::Start(element) | Event::Empty(element) => {
                    let name = element.local_name();
                    if name.as_ref() != ROOT_ELEMENT {
                        return Err(DecodeError::UnexpectedRoot(
                            String::from_utf8_lossy(name.as_ref()).into_owned(),
                        ));
                    }
                    break;
                }
                Event::Eof => return Err(DecodeError::EmptyDocument),
                _ => {}
            }
        }

        Ok(quick_xml::de::from_str(xml)?)
    }

    /// `HIK_<mac without colons>`, or `HIK_<ip>` when no MAC is reported
    pub fn device_id(&self) -> String {
        if self.mac_address.is_empty() {
            format!("{}{}", DEVICE_ID_PREFIX, self.ip_address)
        } else {
            format!("{}{}", DEVICE_ID_PREFIX, self.mac_address.replace(':', ""))
        }
    }

    pub fn channel_id(&self) -> String {
        format!("{}{}", CHANNEL_ID_PREFIX, self.channel_id)
    }

    fn details(&self) -> EventDetails {
        let mut details = EventDetails::new();
        details.insert("source".into(), SOURCE.into());
        details.insert("ipAddress".into(), self.ip_address.clone().into());
        details.insert("description".into(), self.event_description.clone().into());
        details.insert("state".into(), self.event_state.clone().into());
        details.insert("macAddress".into(), self.mac_address.clone().into());
        details.insert("originalType".into(), self.event_type.clone().into());
        if self.detection_region_id > 0 {
            details.insert("regionId".into(), self.detection_region_id.into());
        }
        details
    }
}

/// Parse a HIKVision `dateTime`, falling back to `now` when neither format matches
pub fn parse_alarm_time(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Ok(time) = DateTime::parse_from_str(raw, OFFSET_TIME_FORMAT) {
        return time.with_timezone(&Utc);
    }
    if let Ok(time) = NaiveDateTime::parse_from_str(raw, UTC_TIME_FORMAT) {
        return time.and_utc();
    }
    tracing::debug!(date_time = %raw, "Unparsable HIKVision dateTime, using current time");
    now
}

/// Decoder for `/hikvision/alarm` bodies
#[derive(Debug, Clone, Copy)]
pub struct HikvisionDecoder {
    normalizer: TypeNormalizer,
    clock: fn() -> DateTime<Utc>,
}

impl HikvisionDecoder {
    pub fn new() -> Self {
        Self {
            normalizer: TypeNormalizer::hikvision(),
            clock: Utc::now,
        }
    }

    /// Use `clock` for alarms whose `dateTime` cannot be parsed
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_normalizer(mut self, normalizer: TypeNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Convert a parsed alarm into a canonical event
    pub fn convert(&self, alarm: &HikvisionAlarm) -> CanonicalEvent {
        CanonicalEvent {
            event_type: self.normalizer.normalize(&alarm.event_type),
            event_time: parse_alarm_time(&alarm.date_time, (self.clock)()),
            device_id: alarm.device_id(),
            channel_id: alarm.channel_id(),
            event_details: alarm.details(),
        }
    }
}

impl Default for HikvisionDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl VendorDecoder for HikvisionDecoder {
    fn vendor(&self) -> Vendor {
        Vendor::Hikvision
    }

    fn decode(&self, body: &[u8]) -> Result<VendorEvent> {
        let xml = std::str::from_utf8(body)?;
        let alarm = HikvisionAlarm::from_xml(xml)?;

        Ok(VendorEvent::Hikvision(HikvisionEvent {
            event: self.convert(&alarm),
            raw_xml: xml.to_string(),
        }))
    }
}
