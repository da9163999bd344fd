pub mod merge;
pub mod quick;
pub mod shuffle_retry;

use std::fmt;
use std::ops::Range;

use clap::ValueEnum;

use crate::permutation::PermutationStore;

pub use merge::MergeSort;
pub use quick::QuickSort;
pub use shuffle_retry::ShuffleRetry;

/// Above this many elements shuffle-retry is not expected to finish.
pub const SHUFFLE_RETRY_PRACTICAL_LIMIT: usize = 10;

/// How a sort run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOutcome {
    Sorted,
    /// Shuffle-retry hit its configured attempt cap before landing on the identity.
    GaveUp { attempts: u64 },
}

/// An in-place sort over a sub-range of the shared permutation.
///
/// Implementations assume they are the only writer and do no
/// synchronisation of their own.
pub trait SortAlgorithm: Send {
    fn name(&self) -> &'static str;

    fn sort(&mut self, permutation: &PermutationStore, range: Range<usize>) -> SortOutcome;
}

/// Algorithm selected at configuration time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmKind {
    /// Reshuffle until sorted (only finishes for a handful of pixels)
    ShuffleRetry,
    /// Top-down merge sort
    Merge,
    /// Quicksort with Lomuto partition
    Quick,
}

impl AlgorithmKind {
    pub fn build(self, seed: u64, max_shuffles: Option<u64>) -> Box<dyn SortAlgorithm> {
        match self {
            AlgorithmKind::ShuffleRetry => Box::new(ShuffleRetry::new(seed, max_shuffles)),
            AlgorithmKind::Merge => Box::new(MergeSort::new()),
            AlgorithmKind::Quick => Box::new(QuickSort),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AlgorithmKind::ShuffleRetry => "shuffle-retry",
            AlgorithmKind::Merge => "merge",
            AlgorithmKind::Quick => "quick",
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};
    use test_log::test;

    fn shuffled(len: usize, seed: u64) -> PermutationStore {
        let store = PermutationStore::identity(len);
        store.shuffle(&mut SmallRng::seed_from_u64(seed));
        store
    }

    #[test]
    fn every_kind_sorts_a_small_permutation() {
        for kind in [AlgorithmKind::ShuffleRetry, AlgorithmKind::Merge, AlgorithmKind::Quick] {
            let store = shuffled(5, 11);
            let mut algorithm = kind.build(42, None);
            let outcome = algorithm.sort(&store, 0..store.len());
            assert_eq!(outcome, SortOutcome::Sorted, "{kind}");
            assert!(store.is_identity(), "{kind}");
        }
    }

    #[test]
    fn names_match_labels() {
        for kind in [AlgorithmKind::ShuffleRetry, AlgorithmKind::Merge, AlgorithmKind::Quick] {
            assert_eq!(kind.build(0, None).name(), kind.label());
        }
    }
}
