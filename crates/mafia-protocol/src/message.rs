//! Named events in both directions.
//!
//! Every frame on the wire is adjacently tagged:
//!
//! ```text
//! { "event": "joinRoom", "data": { "username": "ann", "roomCode": "7KQ2ZD" } }
//! ```
//!
//! Inbound frames decode into [`ClientAction`], outbound events are built as
//! [`ServerEvent`]. Matching on these enums replaces any lookup by event
//! name string.

use serde::{Deserialize, Serialize};

use crate::{
    Ballot, LobbySnapshot, Phase, PlayerId, PlayerView, ProtocolError, RevealEntry, Role,
    RoomCode, Team,
};

/// Longest display name the server accepts, in characters.
const MAX_USERNAME_CHARS: usize = 24;

/// Longest chat line the server relays, in characters.
const MAX_CHAT_CHARS: usize = 500;

// ---------------------------------------------------------------------------
// ClientAction: client → server
// ---------------------------------------------------------------------------

/// An action a connected client asks the server to perform.
///
/// The acting player is never part of the payload: the server knows who
/// sent the frame from the connection it arrived on. Disconnects are not
/// a frame either; the server observes the connection closing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientAction {
    /// Create a room and become its host. `mafia_count` falls back to the
    /// server default when absent.
    CreateRoom {
        username: String,
        #[serde(default)]
        mafia_count: Option<usize>,
    },

    JoinRoom { username: String, room_code: RoomCode },

    /// Re-send the current roster and phase to the requester.
    RequestLobby { room_code: RoomCode },

    /// Host only: assign roles and begin the first night.
    StartGame { room_code: RoomCode },

    MafiaChoose { room_code: RoomCode, target_id: PlayerId },

    MedicChoose { room_code: RoomCode, target_id: PlayerId },

    DetectiveChoose { room_code: RoomCode, target_id: PlayerId },

    /// Cast or replace a day ballot. A null target abstains.
    Vote {
        room_code: RoomCode,
        #[serde(default)]
        target_id: Option<PlayerId>,
    },

    ChatMessage { room_code: RoomCode, text: String },
}

impl ClientAction {
    /// The room this action targets, if any.
    pub fn room_code(&self) -> Option<&RoomCode> {
        match self {
            Self::CreateRoom { .. } => None,
            Self::JoinRoom { room_code, .. }
            | Self::RequestLobby { room_code }
            | Self::StartGame { room_code }
            | Self::MafiaChoose { room_code, .. }
            | Self::MedicChoose { room_code, .. }
            | Self::DetectiveChoose { room_code, .. }
            | Self::Vote { room_code, .. }
            | Self::ChatMessage { room_code, .. } => Some(room_code),
        }
    }

    /// Boundary validation run right after decoding.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Self::CreateRoom { username, .. } => validate_username(username)?,
            Self::JoinRoom { username, .. } => validate_username(username)?,
            Self::ChatMessage { text, .. } => {
                if text.trim().is_empty() {
                    return Err(ProtocolError::InvalidMessage("empty chat message".into()));
                }
                if text.chars().count() > MAX_CHAT_CHARS {
                    return Err(ProtocolError::InvalidMessage(format!(
                        "chat message longer than {MAX_CHAT_CHARS} characters"
                    )));
                }
            }
            _ => {}
        }

        if let Some(code) = self.room_code() {
            if !code.is_well_formed() {
                return Err(ProtocolError::InvalidMessage(format!(
                    "malformed room code {code:?}"
                )));
            }
        }
        Ok(())
    }
}

fn validate_username(name: &str) -> Result<(), ProtocolError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::InvalidMessage("username must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_USERNAME_CHARS {
        return Err(ProtocolError::InvalidMessage(format!(
            "username longer than {MAX_USERNAME_CHARS} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ServerEvent: server → client
// ---------------------------------------------------------------------------

/// An event the server delivers to one or more players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Sent once per connection: the identity the server assigned.
    Welcome { player_id: PlayerId },

    /// Direct ack to the creator of a room.
    RoomCreated { room_code: RoomCode },

    /// Direct ack to a player who joined a room.
    JoinedRoom { room_code: RoomCode },

    /// Full roster/phase snapshot for one player.
    LobbyState(LobbySnapshot),

    /// Roster change broadcast to everyone in the room.
    UpdatePlayers {
        room_code: RoomCode,
        host_id: PlayerId,
        players: Vec<PlayerView>,
    },

    /// Private: the role this player holds for the game.
    YourRole { role: Role },

    /// A timed phase began. `timeout_ms` is how long it lasts.
    PhaseMessage { phase: Phase, timeout_ms: u64 },

    /// Private to the detective: the investigation outcome.
    DetectiveResult { target_id: PlayerId, is_mafia: bool },

    /// Public outcome of the night.
    NightResult {
        killed_id: Option<PlayerId>,
        medic_saved: bool,
        killed_name: Option<String>,
    },

    /// Private to the night's victim.
    YouDied,

    /// Current ballots, in first-vote order.
    VoteUpdate { votes: Vec<Ballot> },

    /// Public outcome of the day vote. Both fields are null when nobody
    /// was lynched.
    VoteResult {
        lynched: Option<PlayerId>,
        lynched_name: Option<String>,
    },

    /// The game is over; every player's true role is revealed.
    GameEnd { winner: Team, reveal: Vec<RevealEntry> },

    /// Room chat, relayed as-is.
    ChatMessage { from: PlayerId, name: String, text: String },

    /// A caller-facing failure for the acting client.
    ErrorMessage { text: String },
}

impl ServerEvent {
    /// Builds an [`ServerEvent::ErrorMessage`] from anything displayable.
    pub fn error(text: impl std::fmt::Display) -> Self {
        Self::ErrorMessage { text: text.to_string() }
    }
}
