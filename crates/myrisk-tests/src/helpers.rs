//! Shared builders for integration tests.

use myrisk_core::types::{ClaimRecord, FamilyScores, FeatureColumn, FeatureMatrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic matrix with small positive integer cells.
///
/// Cell `(i, c)` is `((i * m) % 7) + 1` with `m = c % 5 + 2`, so every
/// column varies and no cell is zero.
pub fn lattice_matrix(rows: usize, cols: usize) -> FeatureMatrix {
    let columns = (0..cols)
        .map(|c| {
            let values = (0..rows).map(|i| ((i * (c % 5 + 2)) % 7 + 1) as f64).collect();
            FeatureColumn::new(format!("f{c}"), values)
        })
        .collect();
    FeatureMatrix::new(columns).expect("lattice columns have equal length")
}

/// Matrix of uniform noise around 100, reproducible from `seed`.
pub fn noisy_matrix(rows: usize, cols: usize, seed: u64) -> FeatureMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let columns = (0..cols)
        .map(|c| {
            let values = (0..rows).map(|_| 100.0 + rng.gen_range(-10.0..10.0)).collect();
            FeatureColumn::new(format!("noise_{c}"), values)
        })
        .collect();
    FeatureMatrix::new(columns).expect("noise columns have equal length")
}

/// Copy of `matrix` with every cell of `row` multiplied by `factor`.
pub fn with_scaled_row(matrix: &FeatureMatrix, row: usize, factor: f64) -> FeatureMatrix {
    let columns = matrix
        .columns()
        .iter()
        .map(|c| {
            let mut values = c.values.clone();
            values[row] *= factor;
            FeatureColumn::new(c.name.clone(), values)
        })
        .collect();
    FeatureMatrix::new(columns).expect("scaling keeps column lengths")
}

/// Copy of `matrix` with one constant column appended.
pub fn with_constant_column(matrix: &FeatureMatrix, name: &str, value: f64) -> FeatureMatrix {
    let mut columns = matrix.columns().to_vec();
    columns.push(FeatureColumn::new(name, vec![value; matrix.n_rows()]));
    FeatureMatrix::new(columns).expect("constant column matches row count")
}

/// Five claims across three providers; provider 2 bills the most.
pub fn scenario_claims() -> Vec<ClaimRecord> {
    vec![
        ClaimRecord::new(1u64, 100.0),
        ClaimRecord::new(1u64, 120.0),
        ClaimRecord::new(2u64, 500.0),
        ClaimRecord::new(2u64, 520.0),
        ClaimRecord::new(3u64, 50.0),
    ]
}

/// Panics unless every score is in `[0, 100]` and every confidence in `[0, 1]`.
pub fn assert_bounded(scores: &FamilyScores) {
    for (family, s) in scores {
        assert!((0.0..=100.0).contains(&s.score), "{family} score {} out of range", s.score);
        assert!(
            (0.0..=1.0).contains(&s.confidence),
            "{family} confidence {} out of range",
            s.confidence
        );
    }
}
