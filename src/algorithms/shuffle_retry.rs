use std::ops::Range;

use rand::{rngs::SmallRng, SeedableRng};

use super::{SortAlgorithm, SortOutcome};
use crate::permutation::PermutationStore;

/// Reshuffles the range until a shuffle happens to come out sorted.
///
/// Expected attempts grow as `n!`, so this only finishes for a few
/// elements. `max_attempts` is an explicit opt-in cap; with `None` it runs
/// until it succeeds.
pub struct ShuffleRetry {
    rng: SmallRng,
    max_attempts: Option<u64>,
    attempts: u64,
}

impl ShuffleRetry {
    pub fn new(seed: u64, max_attempts: Option<u64>) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            max_attempts,
            attempts: 0,
        }
    }

    /// Shuffles performed by the last `sort` call.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }
}

impl SortAlgorithm for ShuffleRetry {
    fn name(&self) -> &'static str {
        "shuffle-retry"
    }

    fn sort(&mut self, permutation: &PermutationStore, range: Range<usize>) -> SortOutcome {
        self.attempts = 0;
        while !permutation.is_sorted(range.clone()) {
            if self.max_attempts.is_some_and(|cap| self.attempts >= cap) {
                return SortOutcome::GaveUp {
                    attempts: self.attempts,
                };
            }
            permutation.shuffle_range(range.clone(), &mut self.rng);
            self.attempts += 1;
        }
        SortOutcome::Sorted
    }
}
