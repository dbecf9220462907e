//! Sparse sample-index selection.
//!
//! Re-querying every historical row against the upstream search index is
//! too expensive, so backfill queries a sparse subset and interpolates
//! the rest. The subset is deterministic from the row count and stride
//! alone: the first row, every `stride`-th row, and the last row.

use std::num::NonZeroUsize;

/// Default sampling stride.
pub const DEFAULT_STRIDE: usize = 20;

/// Select the row indices to query live for an `n`-row series.
///
/// Returns a strictly increasing sequence that always starts at 0 and
/// ends at `n - 1`, with interior indices at multiples of `stride`. The
/// last index is not duplicated when a stride multiple lands on it.
/// `n == 1` yields `[0]`; `n == 0` yields an empty selection.
pub fn select_samples(n: usize, stride: NonZeroUsize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }

    let stride = stride.get();
    let mut indices = vec![0];
    let mut i = stride;
    while i < n {
        indices.push(i);
        i += stride;
    }
    if *indices.last().unwrap_or(&0) != n - 1 {
        indices.push(n - 1);
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stride(s: usize) -> NonZeroUsize {
        NonZeroUsize::new(s).unwrap()
    }

    #[test]
    fn single_row_yields_first_only() {
        assert_eq!(select_samples(1, stride(20)), vec![0]);
    }

    #[test]
    fn empty_series_yields_nothing() {
        assert!(select_samples(0, stride(20)).is_empty());
    }

    #[test]
    fn twenty_five_rows_stride_twenty() {
        assert_eq!(select_samples(25, stride(20)), vec![0, 20, 24]);
    }

    #[test]
    fn stride_landing_on_last_is_not_duplicated() {
        assert_eq!(select_samples(21, stride(20)), vec![0, 20]);
        assert_eq!(select_samples(41, stride(20)), vec![0, 20, 40]);
    }

    #[test]
    fn stride_one_selects_everything() {
        assert_eq!(select_samples(4, stride(1)), vec![0, 1, 2, 3]);
    }

    proptest! {
        #[test]
        fn endpoints_and_bounds_hold(n in 1usize..5000, s in 1usize..100) {
            let indices = select_samples(n, stride(s));

            prop_assert_eq!(*indices.first().unwrap(), 0);
            prop_assert_eq!(*indices.last().unwrap(), n - 1);
            prop_assert!(indices.iter().all(|&i| i < n));
            prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
