//! Core vocabulary shared by every layer: identities, roles, phases, and
//! the snapshot shapes that travel inside events.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Assigned by the server when a connection is accepted and decoupled from
/// the connection itself, so the room layer never sees transport handles.
///
/// `#[serde(transparent)]` serializes `PlayerId(42)` as just `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The short code players type to find a room, e.g. `"7KQ2ZD"`.
///
/// Codes are canonicalised on construction (trimmed, uppercased), so a
/// client typing `"7kq2zd "` still lands in the right room. Deserializing
/// goes through the same path via `#[serde(from = "String")]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of characters in a room code.
    pub const LEN: usize = 6;

    /// The characters a room code is drawn from.
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the code has the canonical length and alphabet.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == Self::LEN
            && self.0.bytes().all(|b| Self::ALPHABET.contains(&b))
    }
}

impl From<String> for RoomCode {
    fn from(raw: String) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }
}

impl From<&str> for RoomCode {
    fn from(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Roles and teams
// ---------------------------------------------------------------------------

/// The secret role a player holds for the duration of a game.
///
/// Every player is `Unassigned` until the host starts the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    #[default]
    Unassigned,
    Mafia,
    Medic,
    Detective,
    Villager,
}

impl Role {
    /// The team a role plays for. Unassigned players count as town.
    pub fn team(self) -> Team {
        match self {
            Self::Mafia => Team::Mafia,
            _ => Team::Town,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unassigned => "unassigned",
            Self::Mafia => "mafia",
            Self::Medic => "medic",
            Self::Detective => "detective",
            Self::Villager => "villager",
        };
        f.write_str(name)
    }
}

/// A winning side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Team {
    Town,
    Mafia,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Town => f.write_str("town"),
            Self::Mafia => f.write_str("mafia"),
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The stage of a room's game cycle.
///
/// ```text
/// Lobby → NightMafia → NightMedic → NightDetective → NightResolve
///                                                        │
///        ┌──────────────── VoteResolve ←── Day ←─────────┘
///        ↓                      │
///   NightMafia             GameEnd (terminal)
/// ```
///
/// `NightResolve` and `VoteResolve` are instantaneous: the room passes
/// through them synchronously and never waits in them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Lobby,
    NightMafia,
    NightMedic,
    NightDetective,
    NightResolve,
    Day,
    VoteResolve,
    GameEnd,
}

impl Phase {
    /// Returns `true` for the three timed night sub-phases.
    pub fn is_night(self) -> bool {
        matches!(self, Self::NightMafia | Self::NightMedic | Self::NightDetective)
    }

    /// Returns `true` once the host has started the game and it hasn't ended.
    pub fn is_in_game(self) -> bool {
        !matches!(self, Self::Lobby | Self::GameEnd)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lobby => "lobby",
            Self::NightMafia => "nightMafia",
            Self::NightMedic => "nightMedic",
            Self::NightDetective => "nightDetective",
            Self::NightResolve => "nightResolve",
            Self::Day => "day",
            Self::VoteResolve => "voteResolve",
            Self::GameEnd => "gameEnd",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Snapshot shapes
// ---------------------------------------------------------------------------

/// The public view of a player. Never carries the role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub alive: bool,
}

/// One line of the end-of-game reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealEntry {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
}

/// A day ballot. `target == None` is an abstention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ballot {
    pub voter: PlayerId,
    pub target: Option<PlayerId>,
}

/// Everything a client needs to render the lobby or rejoin the view of a
/// running room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbySnapshot {
    pub room_code: RoomCode,
    pub host_id: PlayerId,
    pub phase: Phase,
    pub players: Vec<PlayerView>,
    pub mafia_count: usize,
    pub min_players: usize,
    pub max_players: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
    }

    #[test]
    fn test_room_code_is_canonicalised() {
        let code = RoomCode::from(" ab12cd ");
        assert_eq!(code.as_str(), "AB12CD");
        assert!(code.is_well_formed());
    }

    #[test]
    fn test_room_code_deserializes_through_canonical_form() {
        let code: RoomCode = serde_json::from_str("\"xy9z8w\"").unwrap();
        assert_eq!(code, RoomCode::from("XY9Z8W"));
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"XY9Z8W\"");
    }

    #[test]
    fn test_room_code_shape_checks() {
        assert!(!RoomCode::from("ABC").is_well_formed());
        assert!(!RoomCode::from("ABC-12").is_well_formed());
        assert!(!RoomCode::from("ABCDEFG").is_well_formed());
    }

    #[test]
    fn test_role_serializes_camel_case() {
        assert_eq!(serde_json::to_string(&Role::Detective).unwrap(), "\"detective\"");
        assert_eq!(serde_json::to_string(&Role::Unassigned).unwrap(), "\"unassigned\"");
    }

    #[test]
    fn test_role_team() {
        assert_eq!(Role::Mafia.team(), Team::Mafia);
        assert_eq!(Role::Medic.team(), Team::Town);
        assert_eq!(Role::Villager.team(), Team::Town);
    }

    #[test]
    fn test_phase_serializes_like_display() {
        for phase in [
            Phase::Lobby,
            Phase::NightMafia,
            Phase::NightDetective,
            Phase::Day,
            Phase::GameEnd,
        ] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json, format!("\"{phase}\""));
        }
    }

    #[test]
    fn test_phase_classification() {
        assert!(Phase::NightMedic.is_night());
        assert!(!Phase::Day.is_night());
        assert!(Phase::Day.is_in_game());
        assert!(!Phase::Lobby.is_in_game());
        assert!(!Phase::GameEnd.is_in_game());
    }
}
