use std::ops::Range;

use super::{SortAlgorithm, SortOutcome};
use crate::permutation::PermutationStore;

/// Quicksort with a Lomuto partition around the last element.
#[derive(Debug, Default)]
pub struct QuickSort;

impl SortAlgorithm for QuickSort {
    fn name(&self) -> &'static str {
        "quick"
    }

    fn sort(&mut self, permutation: &PermutationStore, range: Range<usize>) -> SortOutcome {
        quicksort(permutation, range);
        SortOutcome::Sorted
    }
}

// Recurses into the smaller side and loops on the larger one, so stack depth
// stays logarithmic even when a partition is maximally lopsided.
fn quicksort(arr: &PermutationStore, mut range: Range<usize>) {
    while range.len() > 1 {
        let pivot = partition(arr, range.clone());
        let below = range.start..pivot;
        let above = pivot + 1..range.end;
        if below.len() < above.len() {
            quicksort(arr, below);
            range = above;
        } else {
            quicksort(arr, above);
            range = below;
        }
    }
}

/// Lomuto partition of `range`; the pivot is the last element.
///
/// Smaller elements are swapped to the front during one forward scan and the
/// pivot is placed right after them. Returns the pivot's final index, or
/// `range.start` for an empty range.
pub fn partition(arr: &PermutationStore, range: Range<usize>) -> usize {
    if range.is_empty() {
        return range.start;
    }
    let high = range.end - 1;
    let pivot = arr.get(high);
    let mut store_idx = range.start;

    for j in range.start..high {
        if arr.get(j) < pivot {
            arr.swap(store_idx, j);
            store_idx += 1;
        }
    }
    arr.swap(store_idx, high);
    store_idx
}
