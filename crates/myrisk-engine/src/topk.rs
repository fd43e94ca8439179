//! Top-k deviation scorer.
//!
//! Averages the `k` largest absolute values of a deviation series and
//! scales the result onto 0–100. Over a matrix, the series is the row-wise
//! mean of per-column robust z-scores, so a single row far from the bulk of
//! the data in several features dominates the score.

use myrisk_core::constants::{clamp_score, SCORE_MIN, TOPK_DEFAULT_K, TOPK_SCALE};
use myrisk_core::traits::AnomalyScorer;
use myrisk_core::types::FeatureMatrix;

use crate::robust::{robust_z_columns, row_means};

/// Deterministic scorer over the strongest deviations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopKDeviation {
    /// How many of the largest absolute deviations to average. `0` averages
    /// all of them.
    pub k: usize,
    /// Multiplier applied to the mean before clamping.
    pub scale: f64,
}

impl TopKDeviation {
    pub fn new(k: usize, scale: f64) -> Self {
        Self { k, scale }
    }

    /// Score a one-dimensional deviation series.
    ///
    /// Non-finite entries are ignored. If fewer than `k` values remain, all
    /// of them are averaged. An empty series scores [`SCORE_MIN`].
    pub fn score_series(&self, z: &[f64]) -> f64 {
        let mut magnitudes: Vec<f64> = z
            .iter()
            .filter(|v| v.is_finite())
            .map(|v| v.abs())
            .collect();
        if magnitudes.is_empty() {
            return SCORE_MIN;
        }
        magnitudes.sort_by(|a, b| b.total_cmp(a));
        let take = if self.k == 0 { magnitudes.len() } else { self.k.min(magnitudes.len()) };
        let mean = magnitudes[..take].iter().sum::<f64>() / take as f64;
        clamp_score(mean * self.scale)
    }
}

impl Default for TopKDeviation {
    fn default() -> Self {
        Self::new(TOPK_DEFAULT_K, TOPK_SCALE)
    }
}

impl AnomalyScorer for TopKDeviation {
    fn name(&self) -> &'static str {
        "topk_deviation"
    }

    fn score(&self, matrix: &FeatureMatrix, _seed: u64) -> f64 {
        let z = robust_z_columns(matrix);
        self.score_series(&row_means(&z, matrix.n_rows()))
    }
}

/// Top-k deviation score of `z` with the default scale.
///
/// # Examples
///
/// ```
/// use myrisk_engine::topk_deviation_score;
/// // mean of the two largest |z| is 2.5, times 10
/// assert_eq!(topk_deviation_score(&[1.0, -3.0, 2.0, 0.5], 2), 25.0);
/// ```
pub fn topk_deviation_score(z: &[f64], k: usize) -> f64 {
    TopKDeviation::new(k, TOPK_SCALE).score_series(z)
}
