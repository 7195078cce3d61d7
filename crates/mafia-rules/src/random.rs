//! Injectable randomness.
//!
//! Every random decision in a game (the role shuffle, the mafia fallback
//! target, room codes) goes through [`RandomSource`]. Production rooms use
//! a seeded [`StdRng`]; tests hand in a [`ScriptedRandom`] so a scenario
//! plays out the same way every run.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::Rng;

/// A source of uniform random indices.
pub trait RandomSource {
    /// Returns a uniformly distributed value in `0..bound`.
    ///
    /// Callers never pass `bound == 0`.
    fn below(&mut self, bound: usize) -> usize;
}

impl RandomSource for StdRng {
    fn below(&mut self, bound: usize) -> usize {
        self.random_range(0..bound)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn below(&mut self, bound: usize) -> usize {
        (**self).below(bound)
    }
}

/// A deterministic source that replays a fixed script.
///
/// Each call consumes the next scripted value and reduces it modulo the
/// requested bound. Once the script runs out every call returns 0, which
/// makes Fisher–Yates leave the remaining prefix in a predictable order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    script: VecDeque<usize>,
}

impl ScriptedRandom {
    pub fn new(script: impl IntoIterator<Item = usize>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// Values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn below(&mut self, bound: usize) -> usize {
        self.script.pop_front().map_or(0, |v| v % bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_scripted_values_are_reduced_into_bound() {
        let mut rng = ScriptedRandom::new([7, 2]);
        assert_eq!(rng.below(5), 2);
        assert_eq!(rng.below(5), 2);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn test_scripted_returns_zero_when_exhausted() {
        let mut rng = ScriptedRandom::default();
        assert_eq!(rng.below(9), 0);
    }

    #[test]
    fn test_std_rng_stays_in_bound() {
        let mut rng = StdRng::seed_from_u64(11);
        for bound in 1..50 {
            assert!(rng.below(bound) < bound);
        }
    }

    #[test]
    fn test_boxed_source_delegates() {
        let mut boxed: Box<dyn RandomSource + Send> = Box::new(ScriptedRandom::new([3]));
        assert_eq!(boxed.below(10), 3);
    }
}
