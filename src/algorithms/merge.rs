use std::ops::Range;

use super::{SortAlgorithm, SortOutcome};
use crate::permutation::PermutationStore;

/// Size of u32 in bytes for scratch tracking
const ELEMENT_SIZE: usize = 4;

/// Top-down merge sort writing straight into the shared permutation.
#[derive(Debug, Default)]
pub struct MergeSort {
    peak_scratch: usize,
}

impl MergeSort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest scratch buffer (in bytes) allocated by the last `sort` call.
    pub fn peak_scratch(&self) -> usize {
        self.peak_scratch
    }

    fn sort_recursive(&mut self, arr: &PermutationStore, left: usize, right: usize) {
        if right - left <= 1 {
            return;
        }

        let mid = left + (right - left) / 2;
        self.sort_recursive(arr, left, mid);
        self.sort_recursive(arr, mid, right);
        let scratch = merge_runs(arr, left, mid, right);
        self.peak_scratch = self.peak_scratch.max(scratch * ELEMENT_SIZE);
    }
}

impl SortAlgorithm for MergeSort {
    fn name(&self) -> &'static str {
        "merge"
    }

    fn sort(&mut self, permutation: &PermutationStore, range: Range<usize>) -> SortOutcome {
        self.peak_scratch = 0;
        self.sort_recursive(permutation, range.start, range.end);
        log::debug!("merge sort peak scratch: {} bytes", self.peak_scratch);
        SortOutcome::Sorted
    }
}

/// Merges the sorted runs `left..mid` and `mid..right` in place.
///
/// Both runs are copied, left then right, into one scratch buffer that is
/// dropped on return. Ties take the left element. Returns the scratch length.
pub fn merge_runs(arr: &PermutationStore, left: usize, mid: usize, right: usize) -> usize {
    let temp: Vec<u32> = (left..right).map(|idx| arr.get(idx)).collect();
    let split = mid - left;
    let (left_run, right_run) = temp.split_at(split);

    let mut i = 0;
    let mut j = 0;
    let mut k = left;

    while i < left_run.len() && j < right_run.len() {
        if left_run[i] <= right_run[j] {
            arr.set(k, left_run[i]);
            i += 1;
        } else {
            arr.set(k, right_run[j]);
            j += 1;
        }
        k += 1;
    }

    for &value in &left_run[i..] {
        arr.set(k, value);
        k += 1;
    }

    for &value in &right_run[j..] {
        arr.set(k, value);
        k += 1;
    }

    temp.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn merges_adjacent_runs() {
        let store = PermutationStore::from_values(vec![0, 2, 1, 3]);
        assert_eq!(merge_runs(&store, 0, 2, 4), 4);
        assert_eq!(store.snapshot(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn merge_with_one_empty_run_is_a_no_op() {
        let store = PermutationStore::from_values(vec![1, 2, 0]);
        merge_runs(&store, 0, 2, 2);
        assert_eq!(store.snapshot(), vec![1, 2, 0]);
    }

    #[test]
    fn sorts_only_the_requested_range() {
        let store = PermutationStore::from_values(vec![5, 3, 4, 2, 1, 0]);
        MergeSort::new().sort(&store, 1..4);
        assert_eq!(store.snapshot(), vec![5, 2, 3, 4, 1, 0]);
    }

    #[test]
    fn scratch_peaks_at_the_top_level_merge() {
        let store = PermutationStore::from_values((0..100).rev().collect());
        let mut sorter = MergeSort::new();
        assert_eq!(sorter.sort(&store, 0..100), SortOutcome::Sorted);
        assert!(store.is_identity());
        assert_eq!(sorter.peak_scratch(), 100 * ELEMENT_SIZE);
    }
}
