//! Day vote counting.

use std::collections::HashMap;

use mafia_protocol::{Ballot, PlayerId};

/// Picks the lynch target by plurality.
///
/// Abstentions are ignored. The target with the most ballots wins; on a
/// tie the target that reached the winning count first, walking the
/// ballots in order, is kept. Returns `None` when nobody voted for anyone.
pub fn tally_votes(ballots: &[Ballot]) -> Option<PlayerId> {
    let mut counts: HashMap<PlayerId, usize> = HashMap::new();
    let mut leader: Option<(PlayerId, usize)> = None;

    for target in ballots.iter().filter_map(|b| b.target) {
        let count = counts.entry(target).or_insert(0);
        *count += 1;
        // Strictly greater: an equal count never displaces the leader.
        if leader.is_none_or(|(_, best)| *count > best) {
            leader = Some((target, *count));
        }
    }

    leader.map(|(target, _)| target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ballot(voter: u64, target: Option<u64>) -> Ballot {
        Ballot {
            voter: PlayerId(voter),
            target: target.map(PlayerId),
        }
    }

    #[test]
    fn test_majority_wins() {
        let ballots = [ballot(1, Some(10)), ballot(2, Some(10)), ballot(3, Some(20))];
        assert_eq!(tally_votes(&ballots), Some(PlayerId(10)));
    }

    #[test]
    fn test_exact_tie_goes_to_first_seen() {
        let ballots = [ballot(1, Some(10)), ballot(2, Some(20))];
        assert_eq!(tally_votes(&ballots), Some(PlayerId(10)));

        let ballots = [ballot(1, Some(20)), ballot(2, Some(10))];
        assert_eq!(tally_votes(&ballots), Some(PlayerId(20)));
    }

    #[test]
    fn test_tie_goes_to_first_to_reach_the_count() {
        // 10 leads at 1, 20 reaches 2 first, 10 only ties it afterwards.
        let ballots = [
            ballot(1, Some(10)),
            ballot(2, Some(20)),
            ballot(3, Some(20)),
            ballot(4, Some(10)),
        ];
        assert_eq!(tally_votes(&ballots), Some(PlayerId(20)));
    }

    #[test]
    fn test_abstentions_are_ignored() {
        let ballots = [ballot(1, None), ballot(2, None), ballot(3, Some(30))];
        assert_eq!(tally_votes(&ballots), Some(PlayerId(30)));
    }

    #[test]
    fn test_no_ballots_means_no_lynch() {
        assert_eq!(tally_votes(&[]), None);
        assert_eq!(tally_votes(&[ballot(1, None)]), None);
    }
}
