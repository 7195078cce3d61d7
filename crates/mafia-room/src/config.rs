//! Room configuration and per-room settings.

use std::time::Duration;

use mafia_protocol::Phase;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Server-wide defaults every new room starts from.
///
/// The server builder takes one of these; tests shrink the durations or
/// lean on Tokio's paused clock instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Minimum players required before the host can start.
    pub min_players: usize,

    /// Maximum players a room admits.
    pub max_players: usize,

    /// Mafia seats when the creator doesn't ask for a specific number.
    pub default_mafia_count: usize,

    /// Length of each night sub-phase (mafia, medic, detective).
    pub night_phase: Duration,

    /// Length of the day discussion and vote.
    pub day_phase: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 4,
            max_players: 10,
            default_mafia_count: 1,
            night_phase: Duration::from_millis(30_000),
            day_phase: Duration::from_millis(120_000),
        }
    }
}

impl RoomConfig {
    /// How long `phase` lasts, or `None` for phases the room passes
    /// through without waiting.
    pub fn phase_duration(&self, phase: Phase) -> Option<Duration> {
        match phase {
            night if night.is_night() => Some(self.night_phase),
            Phase::Day => Some(self.day_phase),
            _ => None,
        }
    }

    /// Settings for a new room, honouring the creator's mafia count.
    ///
    /// The count is clamped to `1..=max_players - 2`. A room without mafia
    /// would end the moment it started, and a full room must still seat the
    /// medic and the detective.
    pub fn settings_for(&self, requested_mafia: Option<usize>) -> RoomSettings {
        let ceiling = self.max_players.saturating_sub(2).max(1);
        RoomSettings {
            mafia_count: requested_mafia
                .unwrap_or(self.default_mafia_count)
                .clamp(1, ceiling),
            min_players: self.min_players,
            max_players: self.max_players,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomSettings
// ---------------------------------------------------------------------------

/// The fixed settings of one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    pub mafia_count: usize,
    pub min_players: usize,
    pub max_players: usize,
}

impl RoomSettings {
    /// Players needed to start: the configured minimum, or enough to seat
    /// every mafia plus the medic and the detective, whichever is larger.
    pub fn players_needed(&self) -> usize {
        self.min_players.max(self.mafia_count.saturating_add(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.min_players, 4);
        assert_eq!(config.max_players, 10);
        assert_eq!(config.default_mafia_count, 1);
        assert_eq!(config.night_phase, Duration::from_secs(30));
        assert_eq!(config.day_phase, Duration::from_secs(120));
    }

    #[test]
    fn test_phase_duration_only_for_timed_phases() {
        let config = RoomConfig::default();
        assert_eq!(config.phase_duration(Phase::NightMafia), Some(config.night_phase));
        assert_eq!(config.phase_duration(Phase::NightMedic), Some(config.night_phase));
        assert_eq!(config.phase_duration(Phase::NightDetective), Some(config.night_phase));
        assert_eq!(config.phase_duration(Phase::Day), Some(config.day_phase));
        assert_eq!(config.phase_duration(Phase::Lobby), None);
        assert_eq!(config.phase_duration(Phase::NightResolve), None);
        assert_eq!(config.phase_duration(Phase::VoteResolve), None);
        assert_eq!(config.phase_duration(Phase::GameEnd), None);
    }

    #[test]
    fn test_settings_for_uses_request_or_default() {
        let config = RoomConfig::default();
        assert_eq!(config.settings_for(Some(3)).mafia_count, 3);
        assert_eq!(config.settings_for(None).mafia_count, 1);
        assert_eq!(config.settings_for(Some(0)).mafia_count, 1);
    }

    #[test]
    fn test_settings_for_caps_mafia_to_fit_room() {
        let config = RoomConfig::default();
        assert_eq!(config.settings_for(Some(8)).mafia_count, 8);
        assert_eq!(config.settings_for(Some(9)).mafia_count, 8);
        assert_eq!(config.settings_for(Some(usize::MAX)).mafia_count, 8);

        let tiny = RoomConfig { max_players: 2, ..RoomConfig::default() };
        assert_eq!(tiny.settings_for(Some(5)).mafia_count, 1);
    }

    #[test]
    fn test_players_needed_covers_role_composition() {
        let mut settings = RoomConfig::default().settings_for(Some(1));
        assert_eq!(settings.players_needed(), 4);

        settings.mafia_count = 3;
        assert_eq!(settings.players_needed(), 5);

        settings.mafia_count = usize::MAX;
        assert_eq!(settings.players_needed(), usize::MAX);
    }
}
