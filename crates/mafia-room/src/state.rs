//! The per-room data aggregate.
//!
//! [`Room`] holds everything about one game session and enforces the data
//! invariants (unique ids, a single host, capacity, role gating). It does
//! no I/O and knows nothing about time; the scheduler drives it.

use std::collections::HashMap;

use mafia_protocol::{
    Ballot, LobbySnapshot, Phase, PlayerId, PlayerView, RevealEntry, Role, RoomCode,
};

use crate::{RoomError, RoomSettings};

/// A seat in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub alive: bool,
    pub role: Role,
}

/// The private night action a role may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NightAction {
    /// Mafia picks who dies.
    Kill,
    /// Medic picks who to protect.
    Save,
    /// Detective picks who to investigate.
    Investigate,
}

impl NightAction {
    /// The role allowed to take this action.
    pub fn role(self) -> Role {
        match self {
            Self::Kill => Role::Mafia,
            Self::Save => Role::Medic,
            Self::Investigate => Role::Detective,
        }
    }

    /// The sub-phase during which this action is collected.
    pub fn phase(self) -> Phase {
        match self {
            Self::Kill => Phase::NightMafia,
            Self::Save => Phase::NightMedic,
            Self::Investigate => Phase::NightDetective,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Kill => "choose a kill",
            Self::Save => "choose a save",
            Self::Investigate => "investigate",
        }
    }
}

/// The choices collected during one night.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NightChoices {
    pub mafia_target: Option<PlayerId>,
    pub medic_save: Option<PlayerId>,
    pub detective_target: Option<PlayerId>,
}

impl NightChoices {
    fn slot(&mut self, action: NightAction) -> &mut Option<PlayerId> {
        match action {
            NightAction::Kill => &mut self.mafia_target,
            NightAction::Save => &mut self.medic_save,
            NightAction::Investigate => &mut self.detective_target,
        }
    }
}

/// What [`Room::remove_player`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// The player who left.
    pub player: Player,
    /// Set when the leaver was host and someone inherited the role.
    pub new_host: Option<PlayerId>,
}

/// One game session.
#[derive(Debug, Clone)]
pub struct Room {
    code: RoomCode,
    host: PlayerId,
    /// Join order; index 0 is the longest-seated player.
    players: Vec<Player>,
    settings: RoomSettings,
    phase: Phase,
    night: NightChoices,
    /// Ballots in the order voters first voted.
    votes: Vec<Ballot>,
}

impl Room {
    /// Creates a room in the lobby with its host as the only player.
    pub fn new(code: RoomCode, host: PlayerId, host_name: impl Into<String>, settings: RoomSettings) -> Self {
        Self {
            code,
            host,
            players: vec![Player {
                id: host,
                name: host_name.into(),
                alive: true,
                role: Role::Unassigned,
            }],
            settings,
            phase: Phase::Lobby,
            night: NightChoices::default(),
            votes: Vec::new(),
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host(&self) -> PlayerId {
        self.host
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn night(&self) -> &NightChoices {
        &self.night
    }

    pub fn votes(&self) -> &[Ballot] {
        &self.votes
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    pub fn is_alive(&self, id: PlayerId) -> bool {
        self.player(id).is_some_and(|p| p.alive)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    /// Roles of every living player, for win evaluation.
    pub fn living_roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.players.iter().filter(|p| p.alive).map(|p| p.role)
    }

    /// Living players who are not mafia: the candidates for a night kill.
    pub fn alive_non_mafia(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.alive && p.role != Role::Mafia)
            .map(|p| p.id)
            .collect()
    }

    // -- Roster ---------------------------------------------------------

    /// Seats a new player at the end of the join order.
    pub fn add_player(&mut self, id: PlayerId, name: impl Into<String>) -> Result<(), RoomError> {
        if self.contains(id) {
            return Err(RoomError::AlreadyInRoom(id, self.code.clone()));
        }
        if self.phase != Phase::Lobby {
            return Err(RoomError::GameInProgress(self.code.clone()));
        }
        if self.players.len() >= self.settings.max_players {
            return Err(RoomError::RoomFull(self.code.clone()));
        }

        self.players.push(Player {
            id,
            name: name.into(),
            alive: true,
            role: Role::Unassigned,
        });
        Ok(())
    }

    /// Removes a player and everything that refers to them.
    ///
    /// If the host leaves, the earliest-joined remaining player becomes
    /// host. When the last player leaves the host field keeps the departed
    /// id; the caller destroys the room.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Departure> {
        let index = self.players.iter().position(|p| p.id == id)?;
        let player = self.players.remove(index);

        self.votes.retain(|b| b.voter != id);
        for ballot in &mut self.votes {
            if ballot.target == Some(id) {
                ballot.target = None;
            }
        }
        for slot in [
            &mut self.night.mafia_target,
            &mut self.night.medic_save,
            &mut self.night.detective_target,
        ] {
            if *slot == Some(id) {
                *slot = None;
            }
        }

        let new_host = match self.players.first() {
            Some(next) if self.host == id => {
                self.host = next.id;
                Some(next.id)
            }
            _ => None,
        };

        Some(Departure { player, new_host })
    }

    // -- Game lifecycle -------------------------------------------------

    /// Hands out the dealt roles and brings everyone back to life.
    pub fn apply_roles(&mut self, roles: &HashMap<PlayerId, Role>) {
        for player in &mut self.players {
            player.role = roles.get(&player.id).copied().unwrap_or(Role::Villager);
            player.alive = true;
        }
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Marks a living player dead. Returns their name, or `None` if they
    /// are absent or already dead.
    pub fn kill(&mut self, id: PlayerId) -> Option<String> {
        let player = self.players.iter_mut().find(|p| p.id == id && p.alive)?;
        player.alive = false;
        Some(player.name.clone())
    }

    /// Sets the kill target without role checks; used for the deadline
    /// fallback.
    pub(crate) fn set_mafia_target(&mut self, target: Option<PlayerId>) {
        self.night.mafia_target = target;
    }

    pub fn reset_night(&mut self) {
        self.night = NightChoices::default();
    }

    pub fn reset_votes(&mut self) {
        self.votes.clear();
    }

    // -- Actions --------------------------------------------------------

    /// Records a night choice from `actor`. Last submission wins.
    ///
    /// The actor must be alive, hold the action's role, and the room must
    /// be in the action's sub-phase. Mafia cannot target mafia.
    pub fn record_night_choice(
        &mut self,
        actor: PlayerId,
        action: NightAction,
        target: PlayerId,
    ) -> Result<(), RoomError> {
        let authorised = self.phase == action.phase()
            && self
                .player(actor)
                .is_some_and(|p| p.alive && p.role == action.role());
        if !authorised {
            return Err(RoomError::RoleMismatch {
                player: actor,
                action: action.verb(),
            });
        }

        let valid_target = self.player(target).is_some_and(|p| {
            p.alive && !(action == NightAction::Kill && p.role == Role::Mafia)
        });
        if !valid_target {
            return Err(RoomError::InvalidTarget(target));
        }

        *self.night.slot(action) = Some(target);
        Ok(())
    }

    /// Records or replaces a day ballot. `None` abstains.
    ///
    /// A replaced ballot keeps the voter's original position.
    pub fn record_vote(&mut self, voter: PlayerId, target: Option<PlayerId>) -> Result<(), RoomError> {
        if self.phase != Phase::Day || !self.is_alive(voter) {
            return Err(RoomError::RoleMismatch {
                player: voter,
                action: "vote",
            });
        }
        if let Some(target) = target {
            if !self.is_alive(target) {
                return Err(RoomError::InvalidTarget(target));
            }
        }

        match self.votes.iter_mut().find(|b| b.voter == voter) {
            Some(ballot) => ballot.target = target,
            None => self.votes.push(Ballot { voter, target }),
        }
        Ok(())
    }

    // -- Views ----------------------------------------------------------

    /// Public roster: names and life status, never roles.
    pub fn roster(&self) -> Vec<PlayerView> {
        self.players
            .iter()
            .map(|p| PlayerView {
                id: p.id,
                name: p.name.clone(),
                alive: p.alive,
            })
            .collect()
    }

    pub fn snapshot(&self) -> LobbySnapshot {
        LobbySnapshot {
            room_code: self.code.clone(),
            host_id: self.host,
            phase: self.phase,
            players: self.roster(),
            mafia_count: self.settings.mafia_count,
            min_players: self.settings.min_players,
            max_players: self.settings.max_players,
        }
    }

    /// Every player's true role, in join order.
    pub fn reveal(&self) -> Vec<RevealEntry> {
        self.players
            .iter()
            .map(|p| RevealEntry {
                id: p.id,
                name: p.name.clone(),
                role: p.role,
            })
            .collect()
    }
}
