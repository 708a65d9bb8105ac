//! Sparse-table range-minimum oracle.
//!
//! `O(n log n)` construction, `O(1)` queries over half-open ranges. The
//! distributed ANSV never needs this at run time; it is the independent
//! witness the checker and the test suite compare against.

use std::ops::Range;

/// Range-minimum queries over a borrowed slice.
///
/// Ties resolve to the smallest index, both inside the precomputed windows
/// and when the two query windows are combined.
#[derive(Debug, Clone)]
pub struct SparseRmq<'a, T> {
    values: &'a [T],
    /// `levels[k - 1][i]` is the argmin of `values[i..i + 2^k]`.
    levels: Vec<Vec<usize>>,
}

impl<'a, T: Ord> SparseRmq<'a, T> {
    pub fn new(values: &'a [T]) -> Self {
        let n = values.len();
        let mut levels = Vec::new();
        if n >= 2 {
            let depth = n.ilog2() as usize;
            let pairs: Vec<usize> = (0..n - 1)
                .map(|i| if values[i + 1] < values[i] { i + 1 } else { i })
                .collect();
            levels.push(pairs);
            for k in 2..=depth {
                let window = 1 << k;
                let half = window >> 1;
                let prev = &levels[k - 2];
                let level = (0..n - window + 1)
                    .map(|i| pick(prev[i], prev[i + half], values))
                    .collect();
                levels.push(level);
            }
        }
        Self { values, levels }
    }

    /// Index of the minimum on the half-open `range`; ties resolve to the
    /// smallest index.
    ///
    /// # Panics
    ///
    /// If the range is empty or reaches past the end of the slice; both are
    /// programming errors.
    pub fn argmin(&self, range: Range<usize>) -> usize {
        assert!(!range.is_empty(), "range-minimum query on an empty range");
        assert!(
            range.end <= self.values.len(),
            "range-minimum query past the end of the sequence"
        );
        let len = range.end - range.start;
        if len == 1 {
            return range.start;
        }
        let k = len.ilog2() as usize;
        let window = 1usize << k;
        let level = &self.levels[k - 1];
        pick(level[range.start], level[range.end - window], self.values)
    }

    /// The minimum value on the half-open `range`.
    ///
    /// # Panics
    ///
    /// As [`Self::argmin`].
    pub fn min(&self, range: Range<usize>) -> &T {
        &self.values[self.argmin(range)]
    }
}

fn pick<T: Ord>(left: usize, right: usize, values: &[T]) -> usize {
    // `left` starts no later than `right`, so keeping it on ties preserves
    // the smallest-index rule.
    if values[right] < values[left] { right } else { left }
}
