//! Transport layer for the mafia server.
//!
//! Provides the [`Transport`] and [`Connection`] traits the server accepts
//! players through. A connection splits into a [`FrameSender`] and a
//! [`FrameReceiver`] so a player can be written to while the server waits
//! on their next frame.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketReceiver, WebSocketSender, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Waits for and accepts the next incoming connection.
    ///
    /// A failed accept concerns one peer only; the transport keeps
    /// listening.
    async fn accept(&mut self) -> Result<Self::Connection, TransportError>;

    /// The address the transport is listening on.
    fn local_addr(&self) -> Result<SocketAddr, TransportError>;
}

/// An accepted connection, before it is split into halves.
pub trait Connection: Send + 'static {
    type Sender: FrameSender;
    type Receiver: FrameReceiver;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// The remote peer's address.
    fn peer_addr(&self) -> SocketAddr;

    /// Splits the connection into independently owned halves.
    fn split(self) -> (Self::Sender, Self::Receiver);
}

/// The writing half of a connection.
pub trait FrameSender: Send + 'static {
    /// Sends one frame to the remote peer.
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Closes the connection from our side.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// The reading half of a connection.
pub trait FrameReceiver: Send + 'static {
    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}
