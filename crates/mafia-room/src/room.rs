//! Room actor: an isolated Tokio task that owns one game.
//!
//! Each room runs in its own task and owns its [`Room`], its
//! [`PhaseScheduler`] (and with it the phase timer) outright. The outside
//! world talks to it through a [`RoomHandle`]. Commands and phase
//! deadlines are polled in the same `select!` loop, so they never
//! interleave.
//!
//! The actor exits when the game ends, when its last player leaves, or on
//! [`RoomHandle::shutdown`]. Exiting drops the timer; a handle to an exited
//! room reports [`RoomError::RoomNotFound`].

use std::ops::ControlFlow;
use std::sync::Arc;

use mafia_protocol::{Phase, PlayerId, RoomCode, ServerEvent};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::broadcast::{Broadcaster, Outbox, Recipient};
use crate::scheduler::PhaseScheduler;
use crate::state::{NightAction, Room};
use crate::RoomError;

type Reply<T> = oneshot::Sender<Result<T, RoomError>>;

/// Commands sent to a room actor through its channel.
///
/// Variants carrying a `reply` are request/response; the rest are
/// fire-and-forget because their rejections are silent anyway.
pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        name: String,
        reply: Reply<()>,
    },
    Leave {
        player_id: PlayerId,
        reply: Reply<()>,
    },
    /// Re-send the lobby snapshot to one member.
    Lobby {
        player_id: PlayerId,
        reply: Reply<()>,
    },
    Start {
        player_id: PlayerId,
        reply: Reply<()>,
    },
    Night {
        player_id: PlayerId,
        action: NightAction,
        target: PlayerId,
    },
    Vote {
        player_id: PlayerId,
        target: Option<PlayerId>,
    },
    Chat {
        player_id: PlayerId,
        text: String,
    },
    /// Clone of the full room state, roles included. Diagnostics and tests.
    Inspect { reply: oneshot::Sender<Room> },
    Info { reply: oneshot::Sender<RoomInfo> },
    Shutdown,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub host: PlayerId,
    pub phase: Phase,
    pub player_count: usize,
    pub max_players: usize,
    /// Whether a phase deadline is pending.
    pub timer_armed: bool,
}

// ---------------------------------------------------------------------------
// RoomHandle
// ---------------------------------------------------------------------------

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl std::fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHandle")
            .field("code", &self.code)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Whether the actor has exited.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Seats a player in the lobby.
    pub async fn join(&self, player_id: PlayerId, name: impl Into<String>) -> Result<(), RoomError> {
        let name = name.into();
        self.request(|reply| RoomCommand::Join { player_id, name, reply })
            .await?
    }

    /// Removes a player. Fails with [`RoomError::NotInRoom`] if absent.
    pub async fn leave(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Leave { player_id, reply })
            .await?
    }

    /// Asks the room to send `player_id` its current lobby snapshot.
    pub async fn request_lobby(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Lobby { player_id, reply })
            .await?
    }

    /// Starts the game on behalf of `player_id`, who must be host.
    pub async fn start(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start { player_id, reply })
            .await?
    }

    pub async fn night_action(
        &self,
        player_id: PlayerId,
        action: NightAction,
        target: PlayerId,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Night { player_id, action, target }).await
    }

    pub async fn vote(&self, player_id: PlayerId, target: Option<PlayerId>) -> Result<(), RoomError> {
        self.send(RoomCommand::Vote { player_id, target }).await
    }

    pub async fn chat(&self, player_id: PlayerId, text: impl Into<String>) -> Result<(), RoomError> {
        let text = text.into();
        self.send(RoomCommand::Chat { player_id, text }).await
    }

    /// Full room state, hidden roles included.
    pub async fn snapshot(&self) -> Result<Room, RoomError> {
        self.request(|reply| RoomCommand::Inspect { reply }).await
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::Info { reply }).await
    }

    /// Tells the room to stop. Its pending deadline never fires.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::RoomNotFound(self.code.clone()))
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(make(reply_tx)).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::RoomNotFound(self.code.clone()))
    }
}

// ---------------------------------------------------------------------------
// RoomActor
// ---------------------------------------------------------------------------

struct RoomActor {
    room: Room,
    scheduler: PhaseScheduler,
    broadcaster: Arc<dyn Broadcaster>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        info!(room = %self.room.code(), host = %self.room.host(), "room actor started");

        let host = self.room.host();
        self.dispatch(vec![
            (
                Recipient::Player(host),
                ServerEvent::RoomCreated { room_code: self.room.code().clone() },
            ),
            (Recipient::Player(host), ServerEvent::LobbyState(self.room.snapshot())),
        ]);

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if self.handle(cmd).is_break() {
                        break;
                    }
                }
                deadline = self.scheduler.next_deadline() => {
                    let out = self.scheduler.on_deadline(&mut self.room, deadline);
                    self.dispatch(out);
                }
            }

            if self.room.phase() == Phase::GameEnd {
                break;
            }
        }

        self.scheduler.halt();
        info!(room = %self.room.code(), phase = %self.room.phase(), "room actor stopped");
    }

    fn handle(&mut self, cmd: RoomCommand) -> ControlFlow<()> {
        match cmd {
            RoomCommand::Join { player_id, name, reply } => {
                let result = self.handle_join(player_id, name);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id, reply } => {
                let Some(flow) = self.handle_leave(player_id) else {
                    let _ = reply.send(Err(RoomError::NotInRoom(player_id, self.room.code().clone())));
                    return ControlFlow::Continue(());
                };
                let _ = reply.send(Ok(()));
                return flow;
            }
            RoomCommand::Lobby { player_id, reply } => {
                let result = if self.room.contains(player_id) {
                    self.broadcaster
                        .send(player_id, ServerEvent::LobbyState(self.room.snapshot()));
                    Ok(())
                } else {
                    Err(RoomError::NotInRoom(player_id, self.room.code().clone()))
                };
                let _ = reply.send(result);
            }
            RoomCommand::Start { player_id, reply } => {
                let result = self
                    .scheduler
                    .start_game(&mut self.room, player_id)
                    .map(|out| self.dispatch(out));
                let _ = reply.send(result);
            }
            RoomCommand::Night { player_id, action, target } => {
                let result =
                    self.scheduler
                        .submit_night_action(&mut self.room, player_id, action, target);
                self.dispatch_or_drop(player_id, result);
            }
            RoomCommand::Vote { player_id, target } => {
                let result = self.scheduler.submit_vote(&mut self.room, player_id, target);
                self.dispatch_or_drop(player_id, result);
            }
            RoomCommand::Chat { player_id, text } => self.handle_chat(player_id, text),
            RoomCommand::Inspect { reply } => {
                let _ = reply.send(self.room.clone());
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                info!(room = %self.room.code(), "room shutting down");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_join(&mut self, player_id: PlayerId, name: String) -> Result<(), RoomError> {
        self.room.add_player(player_id, name)?;
        info!(
            room = %self.room.code(),
            %player_id,
            players = self.room.players().len(),
            "player joined"
        );

        let code = self.room.code().clone();
        self.dispatch(vec![
            (Recipient::Player(player_id), ServerEvent::JoinedRoom { room_code: code }),
            (Recipient::Player(player_id), ServerEvent::LobbyState(self.room.snapshot())),
            (Recipient::Room, self.update_players()),
        ]);
        Ok(())
    }

    /// Returns `None` if the player wasn't here.
    fn handle_leave(&mut self, player_id: PlayerId) -> Option<ControlFlow<()>> {
        let departure = self.room.remove_player(player_id)?;
        info!(
            room = %self.room.code(),
            %player_id,
            new_host = ?departure.new_host,
            players = self.room.players().len(),
            "player left"
        );

        if self.room.is_empty() {
            info!(room = %self.room.code(), "last player left, destroying room");
            return Some(ControlFlow::Break(()));
        }

        let out = self.scheduler.on_player_left(&mut self.room);
        self.dispatch(out);
        if self.room.phase() != Phase::GameEnd {
            self.dispatch(vec![(Recipient::Room, self.update_players())]);
        }
        Some(ControlFlow::Continue(()))
    }

    fn handle_chat(&self, player_id: PlayerId, text: String) {
        let Some(player) = self.room.player(player_id) else {
            debug!(room = %self.room.code(), %player_id, "chat from non-member, ignoring");
            return;
        };
        let event = ServerEvent::ChatMessage {
            from: player_id,
            name: player.name.clone(),
            text,
        };
        self.dispatch(vec![(Recipient::Room, event)]);
    }

    /// Delivers an accepted action's events; rejected in-game actions are
    /// dropped without telling the client.
    fn dispatch_or_drop(&self, player_id: PlayerId, result: Result<Outbox, RoomError>) {
        match result {
            Ok(out) => self.dispatch(out),
            Err(err) => debug!(
                room = %self.room.code(),
                %player_id,
                phase = %self.room.phase(),
                error = %err,
                "action rejected"
            ),
        }
    }

    /// Delivers queued events. `Recipient::Room` means everyone seated now.
    fn dispatch(&self, out: Outbox) {
        if out.is_empty() {
            return;
        }
        let everyone = self.room.player_ids();
        for (recipient, event) in out {
            match recipient {
                Recipient::Room => self.broadcaster.broadcast(&everyone, &event),
                Recipient::Player(id) => self.broadcaster.send(id, event),
            }
        }
    }

    fn update_players(&self) -> ServerEvent {
        ServerEvent::UpdatePlayers {
            room_code: self.room.code().clone(),
            host_id: self.room.host(),
            players: self.room.roster(),
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.room.code().clone(),
            host: self.room.host(),
            phase: self.room.phase(),
            player_count: self.room.players().len(),
            max_players: self.room.settings().max_players,
            timer_armed: self.scheduler.timer().is_armed(),
        }
    }
}

/// Spawns a room actor for a freshly created `room` and returns its handle.
///
/// The host is sent `roomCreated` and a lobby snapshot as soon as the actor
/// starts. `channel_size` bounds the command queue; senders wait when it
/// is full.
pub fn spawn_room(
    room: Room,
    scheduler: PhaseScheduler,
    broadcaster: Arc<dyn Broadcaster>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let code = room.code().clone();

    let actor = RoomActor {
        room,
        scheduler,
        broadcaster,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
