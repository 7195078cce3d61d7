//! Secret role assignment.

use std::collections::HashMap;

use mafia_protocol::{PlayerId, Role};

use crate::{RandomSource, RulesError};

/// Shuffles `items` in place with Fisher–Yates, drawing from `rng`.
///
/// Every permutation is equally likely when `rng` is uniform.
pub fn shuffle<T, R: RandomSource + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.below(i + 1);
        items.swap(i, j);
    }
}

/// Deals one role to every player.
///
/// The players are shuffled; the first `mafia_count` become mafia, the
/// next one the medic, the next one the detective, and everyone else a
/// villager.
///
/// # Errors
/// [`RulesError::InsufficientPlayers`] when there are fewer than
/// `mafia_count + 2` players, so there is no seat for the medic and the
/// detective.
pub fn assign_roles<R: RandomSource + ?Sized>(
    players: &[PlayerId],
    mafia_count: usize,
    rng: &mut R,
) -> Result<HashMap<PlayerId, Role>, RulesError> {
    let needed = mafia_count.saturating_add(2);
    if players.len() < needed {
        return Err(RulesError::InsufficientPlayers {
            needed,
            have: players.len(),
            mafia_count,
        });
    }

    let mut order = players.to_vec();
    shuffle(&mut order, rng);

    let roles = order
        .into_iter()
        .enumerate()
        .map(|(seat, player)| {
            let role = match seat {
                s if s < mafia_count => Role::Mafia,
                s if s == mafia_count => Role::Medic,
                s if s == mafia_count + 1 => Role::Detective,
                _ => Role::Villager,
            };
            (player, role)
        })
        .collect();

    Ok(roles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedRandom;

    fn ids(n: u64) -> Vec<PlayerId> {
        (1..=n).map(PlayerId).collect()
    }

    #[test]
    fn test_shuffle_with_zero_script_rotates_left() {
        // j = 0 on every step swaps the tail into slot 0, one at a time.
        let mut items = vec!['a', 'b', 'c', 'd', 'e'];
        shuffle(&mut items, &mut ScriptedRandom::default());
        assert_eq!(items, vec!['b', 'c', 'd', 'e', 'a']);
    }

    #[test]
    fn test_shuffle_identity_script() {
        // j = i on every step leaves the slice untouched.
        let mut items = vec![1, 2, 3, 4];
        shuffle(&mut items, &mut ScriptedRandom::new([3, 2, 1]));
        assert_eq!(items, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_assign_roles_follows_shuffled_order() {
        let roles = assign_roles(&ids(5), 1, &mut ScriptedRandom::default()).unwrap();
        assert_eq!(roles[&PlayerId(2)], Role::Mafia);
        assert_eq!(roles[&PlayerId(3)], Role::Medic);
        assert_eq!(roles[&PlayerId(4)], Role::Detective);
        assert_eq!(roles[&PlayerId(5)], Role::Villager);
        assert_eq!(roles[&PlayerId(1)], Role::Villager);
    }

    #[test]
    fn test_assign_roles_exact_fit() {
        let roles = assign_roles(&ids(4), 2, &mut ScriptedRandom::default()).unwrap();
        assert_eq!(roles.len(), 4);
        assert_eq!(roles.values().filter(|r| **r == Role::Villager).count(), 0);
    }

    #[test]
    fn test_assign_roles_rejects_too_few_players() {
        let err = assign_roles(&ids(3), 2, &mut ScriptedRandom::default()).unwrap_err();
        assert_eq!(
            err,
            RulesError::InsufficientPlayers { needed: 4, have: 3, mafia_count: 2 }
        );
    }

    #[test]
    fn test_assign_roles_huge_mafia_count_is_rejected() {
        let err = assign_roles(&ids(4), usize::MAX, &mut ScriptedRandom::default()).unwrap_err();
        assert_eq!(
            err,
            RulesError::InsufficientPlayers { needed: usize::MAX, have: 4, mafia_count: usize::MAX }
        );
    }
}
