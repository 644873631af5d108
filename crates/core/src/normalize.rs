//! HIKVision event type normalization
//!
//! HIKVision devices report free-form type strings (`VMD`, `linedetection`,
//! `shelteralarm`, `diskfull`, ...). They are mapped onto [`EventKind`] by an
//! ordered table of substring rules evaluated top-down; the first rule with a
//! matching needle wins. Matching is case-insensitive.
//!
//! Rule order is part of the contract. The `io`/`alarm` rule is broad and
//! shadows everything after it: any type containing `alarm` becomes
//! [`EventKind::IoAlarm`], and since `connection` itself contains `io` the
//! `DeviceConnection` rule can never match.

use crate::event::{EventKind, EventType};

/// One normalization rule: any needle contained in the lowercased type selects `kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRule {
    pub needles: &'static [&'static str],
    pub kind: EventKind,
}

impl TypeRule {
    /// `lowered` must already be lowercase
    pub fn matches(&self, lowered: &str) -> bool {
        self.needles.iter().any(|needle| lowered.contains(needle))
    }
}

/// HIKVision precedence list
pub const HIKVISION_TYPE_RULES: &[TypeRule] = &[
    TypeRule { needles: &["motion"], kind: EventKind::MotionDetection },
    TypeRule { needles: &["videoloss"], kind: EventKind::VideoLoss },
    TypeRule { needles: &["tamper", "shelteralarm"], kind: EventKind::TamperDetection },
    TypeRule { needles: &["disk"], kind: EventKind::StorageFailure },
    TypeRule { needles: &["line", "crossing"], kind: EventKind::LineCrossing },
    TypeRule { needles: &["intrusion"], kind: EventKind::IntrusionDetection },
    TypeRule { needles: &["face"], kind: EventKind::FaceDetection },
    TypeRule { needles: &["io", "alarm"], kind: EventKind::IoAlarm },
    TypeRule { needles: &["connection"], kind: EventKind::DeviceConnection },
];

/// Maps vendor-native type strings to canonical event types
#[derive(Debug, Clone, Copy)]
pub struct TypeNormalizer {
    rules: &'static [TypeRule],
}

impl TypeNormalizer {
    pub const fn new(rules: &'static [TypeRule]) -> Self {
        Self { rules }
    }

    /// Normalizer for HIKVision type strings
    pub const fn hikvision() -> Self {
        Self::new(HIKVISION_TYPE_RULES)
    }

    pub fn rules(&self) -> &'static [TypeRule] {
        self.rules
    }

    /// Map `raw` to the first matching rule, or to `UnknownEvent_<lowercased raw>`
    pub fn normalize(&self, raw: &str) -> EventType {
        let lowered = raw.to_lowercase();
        match self.rules.iter().find(|rule| rule.matches(&lowered)) {
            Some(rule) => EventType::Known(rule.kind),
            None => EventType::Unknown(lowered),
        }
    }
}

impl Default for TypeNormalizer {
    fn default() -> Self {
        Self::hikvision()
    }
}
