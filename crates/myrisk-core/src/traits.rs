//! Trait interfaces for the MyRisk engine.
//!
//! - [`AnomalyScorer`]: turns a feature matrix into one bounded score
//!   (myrisk-engine implements top-k deviation, density and isolation
//!   variants)

use crate::types::FeatureMatrix;

/// Pure scoring strategy over a numeric feature matrix.
///
/// Implementations must be deterministic for a given `(matrix, seed)`
/// pair and must fit any statistical model fresh on every call; nothing
/// learned from one matrix may be reused for another. Randomized
/// implementations draw all randomness from `seed`; deterministic ones
/// ignore it.
pub trait AnomalyScorer: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Score `matrix` on a 0–100 scale. Never fails and never returns a
    /// non-finite value; degenerate inputs map to a policy fallback.
    fn score(&self, matrix: &FeatureMatrix, seed: u64) -> f64;
}
