//! Codec trait and implementations for serializing/deserializing events.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The server never cares HOW events are serialized; it only needs
//! something that implements [`Codec`]. Today that is [`JsonCodec`],
//! because browser clients read JSON text frames natively.

use serde::{de::DeserializeOwned, Serialize};

use crate::{ClientAction, ProtocolError};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` lets a single codec value live inside the
/// shared server state and be used from every connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Decodes an inbound frame and validates it at the boundary.
    ///
    /// Everything past this call can assume the action is well formed:
    /// names are non-empty and room codes have the canonical shape.
    fn decode_action(&self, data: &[u8]) -> Result<ClientAction, ProtocolError> {
        let action: ClientAction = self.decode(data)?;
        action.validate()?;
        Ok(action)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use mafia_protocol::{ClientAction, Codec, JsonCodec, RoomCode};
///
/// let codec = JsonCodec;
/// let frame = br#"{"event":"startGame","data":{"roomCode":"ab12cd"}}"#;
///
/// let action = codec.decode_action(frame).unwrap();
/// assert_eq!(
///     action,
///     ClientAction::StartGame { room_code: RoomCode::from("AB12CD") }
/// );
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
