//! `MafiaServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room registry.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mafia_protocol::{JsonCodec, PlayerId};
use mafia_room::{ChannelBroadcaster, RoomConfig, RoomRegistry};
use mafia_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::ServerError;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) broadcaster: Arc<ChannelBroadcaster>,
    pub(crate) codec: JsonCodec,
    next_player: AtomicU64,
}

impl ServerState {
    /// Hands out the identity for a new connection.
    pub(crate) fn next_player_id(&self) -> PlayerId {
        PlayerId(self.next_player.fetch_add(1, Ordering::Relaxed))
    }
}

/// Builder for configuring and starting a mafia server.
///
/// # Example
///
/// ```rust,ignore
/// let server = MafiaServer::builder()
///     .bind("0.0.0.0:8080")
///     .room_config(RoomConfig { max_players: 12, ..RoomConfig::default() })
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct MafiaServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    seed: Option<u64>,
}

impl MafiaServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            seed: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets player limits and phase durations for every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Seeds room codes and role deals, for reproducible runs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Binds the listener. Call [`MafiaServer::run`] to start serving.
    pub async fn build(self) -> Result<MafiaServer, ServerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let broadcaster = Arc::new(ChannelBroadcaster::new());
        let registry = match self.seed {
            Some(seed) => RoomRegistry::with_seed(self.room_config, broadcaster.clone(), seed),
            None => RoomRegistry::new(self.room_config, broadcaster.clone()),
        };

        let state = Arc::new(ServerState {
            registry: Mutex::new(registry),
            broadcaster,
            codec: JsonCodec,
            next_player: AtomicU64::new(1),
        });

        Ok(MafiaServer { transport, state })
    }
}

impl Default for MafiaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound mafia server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct MafiaServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl MafiaServer {
    /// Creates a new builder.
    pub fn builder() -> MafiaServerBuilder {
        MafiaServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the accept loop, spawning a handler task per connection.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "mafia server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
