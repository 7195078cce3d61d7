//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum. A
//! `ProtocolError` always means the problem is in turning events into
//! bytes or back, never in networking or game rules.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into an action).
    ///
    /// Common causes: malformed JSON, an unknown `event` name, missing
    /// required fields, or wrong data types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The action decoded but violates a protocol rule, such as an empty
    /// username or a room code of the wrong shape.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
