//! Error types for the room layer.

use mafia_protocol::{PlayerId, RoomCode};
use mafia_rules::RulesError;

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code. Also returned once a finished room's
    /// actor has shut down.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// The room already holds `max_players`.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// Only the host may start the game.
    #[error("only the host can start the game")]
    NotHost,

    /// Below `min_players`, or too few to seat mafia, medic and detective.
    #[error("need at least {needed} players to start, have {have}")]
    InsufficientPlayers { needed: usize, have: usize },

    /// The player's role (or the current phase) does not authorise this
    /// action. Dropped silently rather than reported.
    #[error("player {player} may not {action} now")]
    RoleMismatch {
        player: PlayerId,
        action: &'static str,
    },

    /// The chosen target is not a living player of the room.
    #[error("player {0} is not a valid target")]
    InvalidTarget(PlayerId),

    /// The player is already seated in this room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomCode),

    /// The player is not in this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomCode),

    /// The room has left the lobby; no joining or restarting.
    #[error("game in room {0} has already started")]
    GameInProgress(RoomCode),
}

impl RoomError {
    /// Whether the acting client should be told about this failure.
    ///
    /// Unauthorised or malformed in-game actions degrade to no-ops.
    pub fn is_caller_facing(&self) -> bool {
        !matches!(self, Self::RoleMismatch { .. } | Self::InvalidTarget(_))
    }
}

impl From<RulesError> for RoomError {
    fn from(err: RulesError) -> Self {
        match err {
            RulesError::InsufficientPlayers { needed, have, .. } => {
                Self::InsufficientPlayers { needed, have }
            }
        }
    }
}
