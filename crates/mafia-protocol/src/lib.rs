//! Wire protocol for the mafia room server.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`PlayerId`], [`RoomCode`], [`Role`], [`Phase`], etc.):
//!   the identity and game vocabulary shared by every layer.
//! - **Messages** ([`ClientAction`], [`ServerEvent`]): the named events
//!   that travel on the wire, one tagged enum per direction.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those events are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer knows nothing about connections, timers, or rooms.
//!
//! ```text
//! Transport (frames) → Protocol (ClientAction / ServerEvent) → Room actors
//! ```

mod codec;
mod error;
mod message;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{ClientAction, ServerEvent};
pub use types::{
    Ballot, LobbySnapshot, Phase, PlayerId, PlayerView, RevealEntry, Role,
    RoomCode, Team,
};
