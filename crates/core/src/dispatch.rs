//! Event dispatch
//!
//! Routes a [`VendorEvent`] to the handler registered for its
//! `(vendor, kind)` key. Events with no registered handler (including every
//! `UnknownEvent_*` and verbatim vendor type) take the unhandled path, which
//! only logs. Dispatch never fails.

use std::collections::HashMap;
use std::sync::Arc;

use crate::event::{EventKind, Vendor, VendorEvent};

/// Per-type hook run for a dispatched event
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &VendorEvent);
}

impl<F> EventHandler for F
where
    F: Fn(&VendorEvent) + Send + Sync,
{
    fn handle(&self, event: &VendorEvent) {
        self(event)
    }
}

/// Which terminal path an event took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    Unhandled,
}

/// Handler table keyed by vendor and canonical kind
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<(Vendor, EventKind), Arc<dyn EventHandler>>,
}

impl Dispatcher {
    /// Empty table: every event takes the unhandled path
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in diagnostic hooks
    pub fn with_default_handlers() -> Self {
        let mut dispatcher = Self::new();

        dispatcher
            .register(Vendor::Vivotek, EventKind::MotionDetection, log_motion)
            .register(Vendor::Vivotek, EventKind::VideoLoss, log_video_loss)
            .register(Vendor::Vivotek, EventKind::DeviceConnection, log_connection);

        dispatcher
            .register(Vendor::Hikvision, EventKind::MotionDetection, log_motion)
            .register(Vendor::Hikvision, EventKind::VideoLoss, log_video_loss)
            .register(Vendor::Hikvision, EventKind::LineCrossing, log_smart_event)
            .register(Vendor::Hikvision, EventKind::IntrusionDetection, log_smart_event)
            .register(Vendor::Hikvision, EventKind::IoAlarm, log_io_alarm)
            .register(Vendor::Hikvision, EventKind::DeviceConnection, log_connection);

        dispatcher
    }

    /// Register (or replace) the handler for `(vendor, kind)`
    pub fn register<H>(&mut self, vendor: Vendor, kind: EventKind, handler: H) -> &mut Self
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert((vendor, kind), Arc::new(handler));
        self
    }

    pub fn has_handler(&self, vendor: Vendor, kind: EventKind) -> bool {
        self.handlers.contains_key(&(vendor, kind))
    }

    /// Run the handler for `event`, or log it as unhandled
    pub fn dispatch(&self, event: &VendorEvent) -> DispatchOutcome {
        let vendor = event.vendor();
        let handler = event
            .event_type()
            .kind()
            .and_then(|kind| self.handlers.get(&(vendor, kind)));

        match handler {
            Some(handler) => {
                handler.handle(event);
                DispatchOutcome::Handled
            }
            None => {
                tracing::info!(
                    vendor = %vendor,
                    event_type = %event.event_type(),
                    "Unhandled {} event type: {}",
                    vendor,
                    event.event_type()
                );
                DispatchOutcome::Unhandled
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<String> = self
            .handlers
            .keys()
            .map(|(vendor, kind)| format!("{}/{}", vendor, kind))
            .collect();
        keys.sort();
        f.debug_struct("Dispatcher").field("handlers", &keys).finish()
    }
}

fn log_motion(event: &VendorEvent) {
    let e = event.event();
    tracing::info!(
        vendor = %event.vendor(),
        device_id = %e.device_id,
        channel_id = %e.channel_id,
        "{} motion detected on device {}, channel {}",
        event.vendor(),
        e.device_id,
        e.channel_id
    );
}

fn log_video_loss(event: &VendorEvent) {
    let e = event.event();
    tracing::info!(
        vendor = %event.vendor(),
        device_id = %e.device_id,
        channel_id = %e.channel_id,
        "{} video lost on device {}, channel {}",
        event.vendor(),
        e.device_id,
        e.channel_id
    );
}

fn log_connection(event: &VendorEvent) {
    let e = event.event();
    tracing::info!(
        vendor = %event.vendor(),
        device_id = %e.device_id,
        "{} connection event for device {}",
        event.vendor(),
        e.device_id
    );
}

fn log_smart_event(event: &VendorEvent) {
    let e = event.event();
    tracing::info!(
        vendor = %event.vendor(),
        event_type = %e.event_type,
        device_id = %e.device_id,
        channel_id = %e.channel_id,
        "{} smart event {} on device {}, channel {}",
        event.vendor(),
        e.event_type,
        e.device_id,
        e.channel_id
    );
}

fn log_io_alarm(event: &VendorEvent) {
    let e = event.event();
    tracing::info!(
        vendor = %event.vendor(),
        device_id = %e.device_id,
        channel_id = %e.channel_id,
        "{} IO alarm on device {}, channel {}",
        event.vendor(),
        e.device_id,
        e.channel_id
    );
}
