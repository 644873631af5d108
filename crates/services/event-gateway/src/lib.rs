//! NVR Event Gateway
//!
//! HTTP endpoint for video-surveillance event notifications. Vivotek NVRs
//! post canonical JSON events, HIKVision devices post XML alarms; both are
//! decoded into one canonical event, counted, dispatched to per-type hooks
//! and fanned out to best-effort sinks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          nvr-event-gateway                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────┐ ← POST /event, /events        (Basic auth)        │
//! │  │  HTTP API Server │ ← POST|GET /hikvision/alarm   (Basic + vendor)    │
//! │  │  (axum)          │ ← GET /health                                     │
//! │  └────────┬─────────┘                                                   │
//! │           │ body                                                        │
//! │           ▼                                                             │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌────────────────────┐  │
//! │  │  VendorDecoder   │──▶│  EventCounter    │──▶│  Dispatcher        │  │
//! │  │  (JSON | XML)    │   │  (AtomicU64)     │   │  (vendor, kind)    │  │
//! │  └──────────────────┘   └──────────────────┘   └─────────┬──────────┘  │
//! │                                                          │              │
//! │                                                          ▼              │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  FanOut: ForwardSink (webhook) → TelegramSink (chat)              │  │
//! │  │  one task + timeout per sink, failures logged only                │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod counter;
pub mod logging;
pub mod pipeline;
pub mod sink;
