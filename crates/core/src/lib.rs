//! NVR Events Core
//!
//! Transport-agnostic half of the NVR event gateway: the canonical event
//! model, the per-vendor decoders, the HIKVision type normalizer and the
//! dispatcher that routes decoded events to per-type handlers.
//!
//! # Architecture
//!
//! ```text
//!   raw body ──▶ VendorDecoder ──▶ VendorEvent ──▶ Dispatcher ──▶ EventHandler
//!                 │                 (Vivotek |       (vendor, kind)
//!                 │                  Hikvision)         table
//!                 └─▶ TypeNormalizer (HIKVision only)
//! ```
//!
//! The HTTP surface, counter and fan-out sinks live in the
//! `nvr-event-gateway` service crate.

pub mod decode;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod normalize;

pub use decode::{HikvisionAlarm, HikvisionDecoder, VendorDecoder, VivotekDecoder};
pub use dispatch::{DispatchOutcome, Dispatcher, EventHandler};
pub use error::{DecodeError, Result};
pub use event::{
    CanonicalEvent, EventDetails, EventKind, EventType, HikvisionEvent, Vendor, VendorEvent,
};
pub use normalize::{TypeNormalizer, TypeRule, HIKVISION_TYPE_RULES};
