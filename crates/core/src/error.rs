//! Error types for NVR Events Core

use thiserror::Error;

/// Result type alias for decode operations
pub type Result<T> = std::result::Result<T, DecodeError>;

/// A request body that cannot be turned into a canonical event.
///
/// Always local to one request: the HTTP layer maps every variant to
/// `400 Bad Request` and the event never reaches the counter or the sinks.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Body is not valid JSON for the canonical event shape
    #[error("Invalid event JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Body is valid JSON but carries no event type
    #[error("Event JSON is missing a non-empty eventType")]
    MissingEventType,

    /// Body is not UTF-8
    #[error("Body is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// Body is not well-formed XML
    #[error("Malformed XML: {0}")]
    XmlSyntax(#[from] quick_xml::Error),

    /// XML is well-formed but does not match the alarm shape
    #[error("Invalid alarm XML: {0}")]
    Xml(#[from] quick_xml::de::DeError),

    /// XML document has no root element
    #[error("XML document has no root element")]
    EmptyDocument,

    /// XML root element is not `<EventNotificationAlert>`
    #[error("Unexpected root element <{0}>, expected <EventNotificationAlert>")]
    UnexpectedRoot(String),
}
