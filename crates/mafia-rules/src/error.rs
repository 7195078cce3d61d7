//! Error types for the rules layer.

/// Errors a rule can report instead of producing a decision.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    /// Not enough players to hand out every mafia seat plus the medic and
    /// the detective.
    #[error("need at least {needed} players for {mafia_count} mafia, have {have}")]
    InsufficientPlayers {
        needed: usize,
        have: usize,
        mafia_count: usize,
    },
}
