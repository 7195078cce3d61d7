//! Per-connection handler: identity, outbound pump, and action routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Assign a PlayerId and register an outbound channel for it
//!   2. Send Welcome
//!   3. Loop: receive frames → decode → route to the registry or a room
//!   4. On close, leave every room the player sat in

use std::sync::Arc;

use mafia_protocol::{ClientAction, Codec, PlayerId, ServerEvent};
use mafia_room::{player_channel, NightAction, PlayerSender, RoomError};
use mafia_transport::{Connection, FrameReceiver, FrameSender, WebSocketConnection, WebSocketSender};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::ServerError;

/// Drop guard that removes a player from the server when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct DisconnectGuard {
    player_id: PlayerId,
    state: Arc<ServerState>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let left = state.registry.lock().await.remove_everywhere(player_id).await;
            state.broadcaster.unregister(player_id);
            tracing::info!(%player_id, rooms_left = left, "player disconnected");
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    let conn_id = conn.id();
    let player_id = state.next_player_id();
    tracing::debug!(%conn_id, %player_id, peer = %conn.peer_addr(), "handling new connection");

    let (sink, mut frames) = conn.split();

    let (tx, rx) = player_channel();
    state.broadcaster.register(player_id, tx.clone());
    let guard = DisconnectGuard {
        player_id,
        state: Arc::clone(&state),
    };

    let writer = tokio::spawn(pump_outbound(sink, rx, Arc::clone(&state), player_id));

    deliver(&tx, ServerEvent::Welcome { player_id });

    loop {
        let data = match frames.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let action = match state.codec.decode_action(&data) {
            Ok(action) => action,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "rejected inbound frame");
                deliver(&tx, ServerEvent::error(e));
                continue;
            }
        };

        if let Err(e) = dispatch(&state, player_id, action).await {
            if e.is_caller_facing() {
                deliver(&tx, ServerEvent::error(&e));
            } else {
                tracing::debug!(%player_id, error = %e, "dropped action");
            }
        }
    }

    // Once the guard unregisters us and `tx` drops, the writer drains
    // what is queued and closes the socket.
    drop(tx);
    drop(guard);
    if writer.await.is_err() {
        tracing::warn!(%player_id, "outbound writer panicked");
    }
    Ok(())
}

/// Routes one decoded action to the registry or the target room.
async fn dispatch(
    state: &ServerState,
    player_id: PlayerId,
    action: ClientAction,
) -> Result<(), RoomError> {
    match action {
        ClientAction::CreateRoom { username, mafia_count } => {
            let code = state
                .registry
                .lock()
                .await
                .create_room(player_id, username.trim(), mafia_count);
            tracing::debug!(%player_id, room = %code, "created room");
            Ok(())
        }
        ClientAction::JoinRoom { username, room_code } => {
            state
                .registry
                .lock()
                .await
                .join_room(&room_code, player_id, username.trim())
                .await
        }
        other => route_to_room(state, player_id, other).await,
    }
}

/// Forwards an in-room action to the room's actor.
async fn route_to_room(
    state: &ServerState,
    player_id: PlayerId,
    action: ClientAction,
) -> Result<(), RoomError> {
    let Some(code) = action.room_code().cloned() else {
        return Ok(());
    };
    // The registry lock is released before the room is contacted.
    let handle = state.registry.lock().await.get(&code)?;

    match action {
        ClientAction::RequestLobby { .. } => handle.request_lobby(player_id).await,
        ClientAction::StartGame { .. } => handle.start(player_id).await,
        ClientAction::MafiaChoose { target_id, .. } => {
            handle.night_action(player_id, NightAction::Kill, target_id).await
        }
        ClientAction::MedicChoose { target_id, .. } => {
            handle.night_action(player_id, NightAction::Save, target_id).await
        }
        ClientAction::DetectiveChoose { target_id, .. } => {
            handle.night_action(player_id, NightAction::Investigate, target_id).await
        }
        ClientAction::Vote { target_id, .. } => handle.vote(player_id, target_id).await,
        ClientAction::ChatMessage { text, .. } => handle.chat(player_id, text).await,
        ClientAction::CreateRoom { .. } | ClientAction::JoinRoom { .. } => Ok(()),
    }
}

/// Encodes queued events and writes them to the socket until the
/// channel closes or the peer goes away.
async fn pump_outbound(
    mut sink: WebSocketSender,
    mut rx: mpsc::Receiver<ServerEvent>,
    state: Arc<ServerState>,
    player_id: PlayerId,
) {
    while let Some(event) = rx.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%player_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = sink.send(&bytes).await {
            tracing::debug!(%player_id, error = %e, "send failed, stopping writer");
            return;
        }
    }
    let _ = sink.close().await;
}

/// Queues a direct reply. Dropped if the writer is gone or the client has
/// stopped reading.
fn deliver(tx: &PlayerSender, event: ServerEvent) {
    if tx.try_send(event).is_err() {
        tracing::debug!("reply dropped, outbound queue unavailable");
    }
}
