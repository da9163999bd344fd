use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::error::SetupError;

/// Shared permutation of pixel indices.
///
/// Slots are atomics accessed with `Relaxed` ordering and no lock. The sort
/// worker is the only writer; the render thread only compares a slot with
/// its own index. A stale read on that side just postpones a pixel's reveal
/// to a later sweep, so nothing stronger is needed.
pub struct PermutationStore {
    slots: Box<[AtomicU32]>,
}

impl PermutationStore {
    /// Identity permutation `0, 1, .., len - 1`.
    pub fn identity(len: usize) -> Self {
        debug_assert!(len <= u32::MAX as usize + 1);
        let slots = (0..len).map(|i| AtomicU32::new(i as u32)).collect();
        Self { slots }
    }

    /// Identity permutation with one slot per image pixel.
    pub fn for_image(width: u32, height: u32) -> Result<Self, SetupError> {
        let len = u64::from(width) * u64::from(height);
        if len > u64::from(u32::MAX) || usize::try_from(len).is_err() {
            return Err(SetupError::TooManyPixels { width, height });
        }
        Ok(Self::identity(len as usize))
    }

    /// Wraps existing values. Callers are expected to pass a permutation of `0..len`.
    pub fn from_values(values: Vec<u32>) -> Self {
        let slots = values.into_iter().map(AtomicU32::new).collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> u32 {
        self.slots[idx].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set(&self, idx: usize, value: u32) {
        self.slots[idx].store(value, Ordering::Relaxed);
    }

    /// Exchanges two slots. Not atomic as a pair; only valid for the single writer.
    #[inline]
    pub fn swap(&self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let va = self.get(a);
        let vb = self.get(b);
        self.set(a, vb);
        self.set(b, va);
    }

    /// True when `idx` holds its own index, i.e. the pixel is back home.
    #[inline]
    pub fn is_home(&self, idx: usize) -> bool {
        self.get(idx) as usize == idx
    }

    /// Non-decreasing over `range`. For a full permutation of `0..len` this
    /// is the same as being the identity.
    pub fn is_sorted(&self, range: Range<usize>) -> bool {
        if range.len() < 2 {
            return true;
        }
        let mut prev = self.get(range.start);
        for idx in range.start + 1..range.end {
            let value = self.get(idx);
            if value < prev {
                return false;
            }
            prev = value;
        }
        true
    }

    pub fn is_identity(&self) -> bool {
        (0..self.len()).all(|idx| self.is_home(idx))
    }

    pub fn snapshot(&self) -> Vec<u32> {
        (0..self.len()).map(|idx| self.get(idx)).collect()
    }

    /// Uniform in-place shuffle of the whole array.
    pub fn shuffle<R: Rng + ?Sized>(&self, rng: &mut R) {
        self.shuffle_range(0..self.len(), rng);
    }

    /// Fisher–Yates over `range`.
    pub fn shuffle_range<R: Rng + ?Sized>(&self, range: Range<usize>, rng: &mut R) {
        let start = range.start;
        for offset in (1..range.len()).rev() {
            let pick = rng.gen_range(0..=offset);
            self.swap(start + offset, start + pick);
        }
    }
}

/// Seed derived from the wall clock.
pub fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
