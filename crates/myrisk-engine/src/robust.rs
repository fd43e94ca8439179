//! Robust standardization: median / MAD z-scores.
//!
//! `z = (x - median) / (MAD_SCALE * MAD)` where MAD is the median absolute
//! deviation from the median. Location and scale are estimated from finite
//! values only; every original element is then standardized, and anything
//! that comes out non-finite becomes 0.

use myrisk_core::constants::{MAD_FLOOR, MAD_SCALE};
use myrisk_core::types::FeatureMatrix;
use tracing::warn;

/// Median of `values`, or `None` if empty. An even count averages the two
/// middle values. Callers pass finite values only.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Robust z-scores of `column`, one per element.
///
/// - No finite values at all: every z is 0.
/// - MAD of zero (e.g. a constant column): MAD is replaced by
///   [`MAD_FLOOR`], so the column standardizes to all zeros instead of
///   dividing by zero.
pub fn robust_z(column: &[f64]) -> Vec<f64> {
    let clean: Vec<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
    let Some(med) = median(&clean) else {
        return vec![0.0; column.len()];
    };

    let deviations: Vec<f64> = clean.iter().map(|v| (v - med).abs()).collect();
    let mad = median(&deviations)
        .filter(|m| *m != 0.0 && m.is_finite())
        .unwrap_or(MAD_FLOOR);
    let denom = MAD_SCALE * mad;

    column
        .iter()
        .map(|x| {
            let z = (x - med) / denom;
            if z.is_finite() { z } else { 0.0 }
        })
        .collect()
}

/// Per-column robust z-scores of `matrix`, column-major.
pub fn robust_z_columns(matrix: &FeatureMatrix) -> Vec<Vec<f64>> {
    matrix.columns().iter().map(|c| robust_z(&c.values)).collect()
}

/// [`FeatureMatrix::complete_rows`], logging how many rows were lost.
pub(crate) fn model_rows(matrix: &FeatureMatrix, scorer: &'static str) -> Vec<Vec<f64>> {
    let rows = matrix.complete_rows();
    if rows.len() < matrix.n_rows() {
        warn!(scorer, kept = rows.len(), dropped = matrix.n_rows() - rows.len(), "dropped incomplete rows");
    }
    rows
}

/// Mean across columns for each of `n_rows` rows of a column-major matrix.
/// Returns an empty vector when there are no columns.
pub fn row_means(columns: &[Vec<f64>], n_rows: usize) -> Vec<f64> {
    if columns.is_empty() {
        return Vec::new();
    }
    let width = columns.len() as f64;
    (0..n_rows)
        .map(|i| columns.iter().map(|c| c[i]).sum::<f64>() / width)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // --- median ---

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    // --- robust_z ---

    #[test]
    fn constant_column_is_all_zero() {
        let z = robust_z(&[7.0; 12]);
        assert_eq!(z, vec![0.0; 12]);
    }

    #[test]
    fn empty_and_all_nan_columns_are_zero() {
        assert!(robust_z(&[]).is_empty());
        assert_eq!(robust_z(&[f64::NAN, f64::INFINITY]), vec![0.0, 0.0]);
    }

    #[test]
    fn known_values() {
        // median 220, deviations [0, 800, 170] -> MAD 170
        let z = robust_z(&[220.0, 1020.0, 50.0]);
        let denom = MAD_SCALE * 170.0;
        assert!(approx(z[0], 0.0));
        assert!(approx(z[1], 800.0 / denom));
        assert!(approx(z[2], -170.0 / denom));
    }

    #[test]
    fn zero_mad_uses_floor() {
        // median 2, deviations [0, 0, 1] -> MAD 0 -> floor 1.0
        let z = robust_z(&[2.0, 2.0, 1.0]);
        assert!(approx(z[2], -1.0 / MAD_SCALE));
        assert_eq!(z[0], 0.0);
    }

    #[test]
    fn non_finite_cells_standardize_to_zero_but_keep_position() {
        let z = robust_z(&[1.0, f64::NAN, 3.0, f64::NEG_INFINITY, 5.0]);
        assert_eq!(z.len(), 5);
        assert_eq!(z[1], 0.0);
        assert_eq!(z[3], 0.0);
        // median of [1, 3, 5] is 3, MAD is 2
        assert!(approx(z[4], 2.0 / (MAD_SCALE * 2.0)));
    }

    #[test]
    fn outlier_does_not_move_the_center() {
        let base = robust_z(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let spiked = robust_z(&[1.0, 2.0, 3.0, 4.0, 5_000.0]);
        assert_eq!(base[2], spiked[2]);
        assert!(spiked[4] > 1_000.0);
    }

    // --- row_means ---

    #[test]
    fn row_means_average_columns() {
        let cols = vec![vec![1.0, 2.0], vec![3.0, 6.0]];
        assert_eq!(row_means(&cols, 2), vec![2.0, 4.0]);
        assert!(row_means(&[], 3).is_empty());
    }

    proptest! {
        #[test]
        fn output_is_finite_and_same_length(
            values in proptest::collection::vec(
                prop_oneof![
                    -1e9f64..1e9,
                    Just(f64::NAN),
                    Just(f64::INFINITY),
                ],
                0..64,
            ),
        ) {
            let z = robust_z(&values);
            prop_assert_eq!(z.len(), values.len());
            prop_assert!(z.iter().all(|v| v.is_finite()));
        }

        #[test]
        fn shift_invariant(
            values in proptest::collection::vec(-1e3f64..1e3, 1..40),
            shift in -1e3f64..1e3,
        ) {
            let a = robust_z(&values);
            let shifted: Vec<f64> = values.iter().map(|v| v + shift).collect();
            let b = robust_z(&shifted);
            for (x, y) in a.iter().zip(&b) {
                prop_assert!((x - y).abs() <= 1e-6 * (1.0 + x.abs()), "{} vs {}", x, y);
            }
        }
    }
}
