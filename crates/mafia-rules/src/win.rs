//! Win condition.

use mafia_protocol::{Role, Team};

/// The outcome of checking the living roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Nobody has won yet; the cycle goes on.
    Continue,
    /// The game is over and this team won.
    Over(Team),
}

/// Decides whether the game is over, given the roles of the living players.
///
/// Town wins as soon as no mafia is alive. Otherwise mafia wins once they
/// are at parity with or outnumber everyone else still alive.
pub fn evaluate_win(living: impl IntoIterator<Item = Role>) -> Verdict {
    let (mafia, others) = living.into_iter().fold((0usize, 0usize), |(m, o), role| {
        match role.team() {
            Team::Mafia => (m + 1, o),
            Team::Town => (m, o + 1),
        }
    });

    if mafia == 0 {
        Verdict::Over(Team::Town)
    } else if mafia >= others {
        Verdict::Over(Team::Mafia)
    } else {
        Verdict::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use Role::*;

    #[test]
    fn test_town_wins_without_living_mafia() {
        assert_eq!(evaluate_win([Villager, Medic]), Verdict::Over(Team::Town));
        assert_eq!(evaluate_win([]), Verdict::Over(Team::Town));
    }

    #[test]
    fn test_mafia_wins_at_parity() {
        assert_eq!(evaluate_win([Mafia, Villager]), Verdict::Over(Team::Mafia));
        assert_eq!(evaluate_win([Mafia, Mafia, Detective, Villager]), Verdict::Over(Team::Mafia));
    }

    #[test]
    fn test_mafia_wins_when_alone() {
        assert_eq!(evaluate_win([Mafia]), Verdict::Over(Team::Mafia));
    }

    #[test]
    fn test_game_continues_while_town_outnumbers() {
        assert_eq!(evaluate_win([Mafia, Medic, Detective, Villager]), Verdict::Continue);
        assert_eq!(evaluate_win([Mafia, Villager, Villager]), Verdict::Continue);
    }
}
