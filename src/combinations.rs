//! Combinations with repetition
//!
//! [`Multisets`] walks every size-`k` multiset over a set of candidate ratings without
//! materialising them. Each multiset is a non-decreasing tuple of indexes into the
//! sorted, de-duplicated candidate list, and tuples are produced in lexicographic order,
//! so two runs over the same candidates yield the same sequence.

use std::iter::FusedIterator;

use smallvec::{SmallVec, smallvec};

use crate::ratings::{INLINE_SLOTS, Rating, RatingCombination};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Fresh,
    Active,
    Exhausted,
}

/// Lazy, forward-only sequence of size-`k` combinations with repetition.
#[derive(Debug, Clone)]
pub struct Multisets {
    values: SmallVec<[Rating; INLINE_SLOTS]>,
    indices: SmallVec<[usize; INLINE_SLOTS]>,
    cursor: Cursor,
}

impl Multisets {
    /// Create the sequence of size-`k` multisets over `candidates`.
    ///
    /// Duplicate candidates collapse into one value.
    pub fn new(candidates: impl IntoIterator<Item = Rating>, k: usize) -> Self {
        let mut values: SmallVec<[Rating; INLINE_SLOTS]> = candidates.into_iter().collect();

        values.sort_unstable();
        values.dedup();

        let cursor = if values.is_empty() && k > 0 {
            Cursor::Exhausted
        } else {
            Cursor::Fresh
        };

        Self {
            values,
            indices: smallvec![0; k],
            cursor,
        }
    }

    /// The distinct candidate values, ascending.
    pub fn values(&self) -> &[Rating] {
        &self.values
    }

    /// Size of each produced combination.
    pub fn k(&self) -> usize {
        self.indices.len()
    }

    /// Total number of combinations the sequence produces from the start.
    pub fn total(&self) -> Option<u128> {
        multiset_count(self.values.len(), self.indices.len())
    }

    fn current(&self) -> RatingCombination {
        self.indices
            .iter()
            .filter_map(|&idx| self.values.get(idx).copied())
            .collect()
    }

    /// Step to the lexicographically next non-decreasing tuple.
    fn advance(&mut self) -> bool {
        let last = self.values.len().saturating_sub(1);

        let Some(pivot) = self.indices.iter().rposition(|&idx| idx < last) else {
            return false;
        };

        let Some(next) = self.indices.get(pivot).map(|idx| idx + 1) else {
            return false;
        };

        for idx in self.indices.iter_mut().skip(pivot) {
            *idx = next;
        }

        true
    }
}

impl Iterator for Multisets {
    type Item = RatingCombination;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor {
            Cursor::Exhausted => None,
            Cursor::Fresh => {
                self.cursor = Cursor::Active;

                Some(self.current())
            }
            Cursor::Active => {
                if self.advance() {
                    Some(self.current())
                } else {
                    self.cursor = Cursor::Exhausted;

                    None
                }
            }
        }
    }
}

impl FusedIterator for Multisets {}

/// Number of size-`k` multisets over `n` distinct values, `C(n + k - 1, k)`.
///
/// Returns `None` when the count does not fit in a `u128`.
pub fn multiset_count(n: usize, k: usize) -> Option<u128> {
    if n == 0 {
        return Some(u128::from(k == 0));
    }

    let n = u128::try_from(n).ok()?;
    let k = u128::try_from(k).ok()?;

    // Each partial product is itself a binomial coefficient, so the division is exact.
    (1..=k).try_fold(1_u128, |acc, i| {
        acc.checked_mul(n - 1 + i).map(|product| product / i)
    })
}
