//! Process-wide event counter
//!
//! Every successfully decoded event is assigned the next counter value. The
//! value is returned to the caller as `eventId`, used in logs and reported by
//! `/health`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic event counter plus process start time
#[derive(Debug)]
pub struct EventCounter {
    count: AtomicU64,
    started_at: Instant,
}

impl EventCounter {
    /// Counter starting at 0
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Increment and return the new value; concurrent callers get distinct, contiguous ids
    pub fn next_id(&self) -> u64 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Number of events counted so far
    pub fn current(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for EventCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Render an uptime as `1h2m3s` / `4m0s` / `12.5s`
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        let millis = uptime.subsec_millis();
        if millis == 0 {
            format!("{}s", seconds)
        } else {
            let fraction = format!("{:03}", millis);
            format!("{}.{}s", seconds, fraction.trim_end_matches('0'))
        }
    }
}
