//! Vendor decoders
//!
//! One [`VendorDecoder`] per wire protocol. A decoder either produces a fully
//! populated [`VendorEvent`] or a [`DecodeError`]; events with no event type
//! never leave this module.

mod hikvision;
mod vivotek;

pub use hikvision::{parse_alarm_time, HikvisionAlarm, HikvisionDecoder, DEVICE_ID_PREFIX};
pub use vivotek::VivotekDecoder;

use crate::error::Result;
use crate::event::{Vendor, VendorEvent};

/// Turns a raw request body into a vendor-tagged canonical event
pub trait VendorDecoder: Send + Sync {
    /// Vendor this decoder accepts
    fn vendor(&self) -> Vendor;

    /// Decode one request body
    fn decode(&self, body: &[u8]) -> Result<VendorEvent>;
}
