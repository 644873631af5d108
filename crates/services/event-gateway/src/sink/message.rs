//! Chat notification text
//!
//! Messages use Telegram's HTML parse mode: a vendor-specific preamble with
//! type, time, device and channel, then a per-type annotation. Every
//! interpolated value is HTML-escaped.

use std::fmt::Write;

use nvr_events_core::{CanonicalEvent, EventKind, VendorEvent};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Build the notification text for `event`
pub fn format_message(event: &VendorEvent) -> String {
    match event {
        VendorEvent::Vivotek(e) => format_vivotek(e),
        VendorEvent::Hikvision(hik) => format_hikvision(&hik.event),
    }
}

fn preamble(title: &str, e: &CanonicalEvent) -> String {
    format!(
        "<b>{}</b>\n\n\
         <b>Event:</b> {}\n\
         <b>Time:</b> {}\n\
         <b>Device:</b> {}\n\
         <b>Channel:</b> {}\n",
        title,
        escape_html(&e.event_type.to_string()),
        e.event_time.format(TIME_FORMAT),
        escape_html(&e.device_id),
        escape_html(&e.channel_id),
    )
}

fn format_vivotek(e: &CanonicalEvent) -> String {
    let mut message = preamble("🚨 NVR Alert", e);

    match e.event_type.kind() {
        Some(EventKind::MotionDetection) => {
            message.push_str("📹 <b>Motion detected!</b>");
            if let Some(zone) = e.detail_str("zoneId") {
                let _ = write!(message, " (Zone: {})", escape_html(zone));
            }
        }
        Some(EventKind::VideoLoss) => {
            message.push_str("⚠️ <b>Video signal lost!</b> Please check camera connection.");
        }
        Some(EventKind::DeviceConnection) => {
            if e.detail_str("status") == Some("disconnected") {
                message.push_str("❌ <b>Device disconnected!</b> Network issue possible.");
            } else {
                message.push_str("✅ <b>Device connected</b> and operating normally.");
            }
        }
        _ => {
            if let Ok(details) = serde_json::to_string(&e.event_details) {
                let _ = write!(message, "\n<pre>{}</pre>", escape_html(&details));
            }
        }
    }

    message
}

fn format_hikvision(e: &CanonicalEvent) -> String {
    let mut message = preamble("🔔 HIKVision Alarm", e);

    if let Some(description) = e.detail_str("description").filter(|d| !d.is_empty()) {
        let _ = writeln!(message, "<b>Description:</b> {}", escape_html(description));
    }

    let annotation = match e.event_type.kind() {
        Some(EventKind::MotionDetection) => Some("📹 <b>Motion detected!</b>"),
        Some(EventKind::LineCrossing) => Some("🚷 <b>Line crossing detected!</b>"),
        Some(EventKind::IntrusionDetection) => Some("🚨 <b>Intrusion detected!</b>"),
        Some(EventKind::FaceDetection) => Some("👤 <b>Face detected!</b>"),
        Some(EventKind::IoAlarm) => Some("🔌 <b>I/O Alarm triggered!</b>"),
        Some(EventKind::TamperDetection) => Some("⚠️ <b>Camera tampering detected!</b>"),
        Some(EventKind::VideoLoss) => Some("⚠️ <b>Video signal lost!</b>"),
        Some(EventKind::StorageFailure) => Some("💾 <b>Storage failure!</b> Check NVR hard drive."),
        Some(EventKind::DeviceConnection) | None => None,
    };

    match annotation {
        Some(line) => message.push_str(line),
        None => {
            if let Some(state) = e.detail_str("state") {
                let _ = write!(message, "\n<b>State:</b> {}", escape_html(state));
            }
        }
    }

    message
}

/// Escape the characters Telegram's HTML mode treats as markup
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
