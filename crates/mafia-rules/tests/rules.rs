//! Property-style checks for the pure rules, driven by seeded RNGs.

use std::collections::HashSet;

use mafia_protocol::{PlayerId, Role, Team};
use mafia_rules::{assign_roles, evaluate_win, shuffle, RandomSource, Verdict};
use rand::rngs::StdRng;
use rand::SeedableRng;

// =========================================================================
// Helpers
// =========================================================================

fn ids(n: u64) -> Vec<PlayerId> {
    (1..=n).map(PlayerId).collect()
}

fn count(roles: &[Role], wanted: Role) -> usize {
    roles.iter().filter(|r| **r == wanted).count()
}

// =========================================================================
// Role assignment
// =========================================================================

#[test]
fn test_role_composition_for_every_valid_size() {
    let mut rng = StdRng::seed_from_u64(7);

    for n in 2..=12u64 {
        for m in 0..=(n as usize - 2) {
            let players = ids(n);
            let roles = assign_roles(&players, m, &mut rng).unwrap();
            let dealt: Vec<Role> = players.iter().map(|p| roles[p]).collect();

            assert_eq!(roles.len(), players.len(), "n={n} m={m}");
            assert_eq!(count(&dealt, Role::Mafia), m, "n={n} m={m}");
            assert_eq!(count(&dealt, Role::Medic), 1, "n={n} m={m}");
            assert_eq!(count(&dealt, Role::Detective), 1, "n={n} m={m}");
            assert_eq!(count(&dealt, Role::Villager), n as usize - m - 2, "n={n} m={m}");
            assert_eq!(count(&dealt, Role::Unassigned), 0, "n={n} m={m}");
        }
    }
}

#[test]
fn test_too_few_players_for_composition_fails() {
    let mut rng = StdRng::seed_from_u64(1);
    for m in 1..5usize {
        let players = ids(m as u64 + 1);
        assert!(assign_roles(&players, m, &mut rng).is_err());
    }
}

#[test]
fn test_every_player_can_draw_mafia() {
    // Over enough seeds each seat should end up mafia at least once.
    let players = ids(6);
    let mut seen = HashSet::new();
    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let roles = assign_roles(&players, 1, &mut rng).unwrap();
        for (player, role) in roles {
            if role == Role::Mafia {
                seen.insert(player);
            }
        }
    }
    assert_eq!(seen.len(), players.len());
}

#[test]
fn test_shuffle_is_a_permutation() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut items: Vec<u32> = (0..50).collect();
    shuffle(&mut items, &mut rng);
    let mut sorted = items.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..50).collect::<Vec<_>>());
}

#[test]
fn test_dyn_random_source_works_with_assign() {
    let mut rng: Box<dyn RandomSource + Send> = Box::new(StdRng::seed_from_u64(3));
    let roles = assign_roles(&ids(5), 1, &mut rng).unwrap();
    assert_eq!(roles.len(), 5);
}

// =========================================================================
// Win evaluation
// =========================================================================

#[test]
fn test_town_iff_no_living_mafia() {
    for others in 0..6 {
        let living = vec![Role::Villager; others];
        assert_eq!(evaluate_win(living), Verdict::Over(Team::Town));
    }
}

#[test]
fn test_mafia_iff_parity_or_majority() {
    for mafia in 1..5usize {
        for others in 0..8usize {
            let mut living = vec![Role::Mafia; mafia];
            living.extend(std::iter::repeat_n(Role::Villager, others));
            let verdict = evaluate_win(living);
            if mafia >= others {
                assert_eq!(verdict, Verdict::Over(Team::Mafia), "m={mafia} o={others}");
            } else {
                assert_eq!(verdict, Verdict::Continue, "m={mafia} o={others}");
            }
        }
    }
}
