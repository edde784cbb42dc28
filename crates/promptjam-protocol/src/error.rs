//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum; a
//! `ProtocolError` always means a serialization problem, never a
//! networking or room-state one.

/// Errors that can occur while encoding or decoding wire events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown event name,
    /// missing fields, or wrong field types. Inbound frames that hit
    /// this are logged and dropped, never fatal to the connection.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but violates the protocol, e.g. a payload field
    /// that is out of range for the event carrying it.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}
