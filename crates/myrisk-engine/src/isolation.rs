//! Isolation forest scorer.
//!
//! Random axis-aligned partitions isolate anomalous rows in fewer splits
//! than typical rows. Each tree is grown on a subsample of at most
//! `max_samples` rows up to depth `ceil(log2(max_samples))`; a row's anomaly
//! score is `2^(-E[h(x)] / c(n))` where `h` is its path length and `c(n)` the
//! expected path length of an unsuccessful BST search over `n` points.
//!
//! All randomness comes from a [`StdRng`] seeded by the caller, so a fit is
//! fully reproducible.

use myrisk_core::constants::{
    clamp_score, ISOLATION_CONTAMINATION, ISOLATION_FALLBACK_SCORE, ISOLATION_MAX_SAMPLES,
    ISOLATION_SCALE, ISOLATION_TREES, MIN_MODEL_ROWS,
};
use myrisk_core::traits::AnomalyScorer;
use myrisk_core::types::FeatureMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::robust::model_rows;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Expected path length of an unsuccessful search in a BST of `n` nodes.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf { size: usize },
    Split { feature: usize, threshold: f64, left: Box<Node>, right: Box<Node> },
}

/// One isolation tree.
#[derive(Debug, Clone)]
pub struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn grow(rows: &[Vec<f64>], sample: Vec<usize>, max_depth: usize, rng: &mut StdRng) -> Self {
        Self { root: grow_node(rows, sample, 0, max_depth, rng) }
    }

    /// Path length of `row`, including the leaf-size adjustment.
    pub fn path_length(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;
        loop {
            match node {
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
                Node::Split { feature, threshold, left, right } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                    depth += 1;
                }
            }
        }
    }
}

fn grow_node(
    rows: &[Vec<f64>],
    idx: Vec<usize>,
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= max_depth || idx.len() <= 1 {
        return Node::Leaf { size: idx.len() };
    }

    let n_features = rows[idx[0]].len();
    let candidates: Vec<(usize, f64, f64)> = (0..n_features)
        .filter_map(|f| {
            let (lo, hi) = idx.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                (lo.min(rows[i][f]), hi.max(rows[i][f]))
            });
            (hi > lo).then_some((f, lo, hi))
        })
        .collect();
    if candidates.is_empty() {
        return Node::Leaf { size: idx.len() };
    }

    let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
    let u: f64 = rng.r#gen();
    let mut threshold = lo + (hi - lo) * u;
    if !threshold.is_finite() || threshold >= hi {
        threshold = lo;
    }

    let (left, right): (Vec<usize>, Vec<usize>) =
        idx.into_iter().partition(|&i| rows[i][feature] <= threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow_node(rows, left, depth + 1, max_depth, rng)),
        right: Box::new(grow_node(rows, right, depth + 1, max_depth, rng)),
    }
}

/// Forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsolationForest {
    pub n_trees: usize,
    pub max_samples: usize,
    /// Expected share of outliers; sets the labelling threshold.
    pub contamination: f64,
}

/// Result of fitting a forest and scoring its own training rows.
#[derive(Debug, Clone)]
pub struct IsolationFit {
    pub trees: Vec<IsolationTree>,
    pub sample_size: usize,
    /// Anomaly score in `(0, 1]` per training row; higher is more anomalous.
    pub scores: Vec<f64>,
    /// Scores strictly above this are labelled outliers.
    pub threshold: f64,
}

impl IsolationFit {
    /// Anomaly score of an arbitrary row under this forest.
    pub fn score_row(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let mean_path =
            self.trees.iter().map(|t| t.path_length(row)).sum::<f64>() / self.trees.len() as f64;
        let c = average_path_length(self.sample_size);
        if c <= 0.0 {
            return 0.5;
        }
        2f64.powf(-mean_path / c)
    }

    /// `-1` for outliers and `1` for inliers, per training row.
    pub fn labels(&self) -> Vec<i8> {
        self.scores
            .iter()
            .map(|s| if *s > self.threshold { -1 } else { 1 })
            .collect()
    }

    pub fn n_outliers(&self) -> usize {
        self.scores.iter().filter(|s| **s > self.threshold).count()
    }
}

/// Linear-interpolated quantile of unsorted `values`, `q` in `[0, 1]`.
fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

impl IsolationForest {
    pub fn new(n_trees: usize, max_samples: usize, contamination: f64) -> Self {
        Self { n_trees, max_samples, contamination }
    }

    /// Fit on `rows` (row-major, all finite) with randomness from `seed`,
    /// then score every training row.
    pub fn fit(&self, rows: &[Vec<f64>], seed: u64) -> IsolationFit {
        let n = rows.len();
        let sample_size = self.max_samples.min(n);
        if sample_size == 0 || self.n_trees == 0 {
            return IsolationFit { trees: Vec::new(), sample_size, scores: vec![0.5; n], threshold: 0.5 };
        }
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;

        let mut rng = StdRng::seed_from_u64(seed);
        let trees: Vec<IsolationTree> = (0..self.n_trees)
            .map(|_| {
                let sample = rand::seq::index::sample(&mut rng, n, sample_size).into_vec();
                IsolationTree::grow(rows, sample, max_depth, &mut rng)
            })
            .collect();

        let mut fit = IsolationFit { trees, sample_size, scores: Vec::new(), threshold: 0.0 };
        let scores: Vec<f64> = rows.iter().map(|r| fit.score_row(r)).collect();
        fit.threshold = quantile(&scores, 1.0 - self.contamination);
        fit.scores = scores;
        fit
    }
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new(ISOLATION_TREES, ISOLATION_MAX_SAMPLES, ISOLATION_CONTAMINATION)
    }
}

/// Operational-family scorer.
///
/// The matrix score is the midpoint of the mean and the maximum per-row
/// anomaly score, times `scale`. The maximum term makes a single extreme row
/// raise the score even though it lowers the other rows' scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsolationScorer {
    pub forest: IsolationForest,
    pub min_rows: usize,
    pub fallback: f64,
    pub scale: f64,
}

impl IsolationScorer {
    pub fn score_rows(&self, rows: &[Vec<f64>], seed: u64) -> f64 {
        if rows.len() < self.min_rows {
            debug!(rows = rows.len(), min_rows = self.min_rows, "isolation: too few rows, using fallback");
            return self.fallback;
        }
        let fit = self.forest.fit(rows, seed);
        let mean = fit.scores.iter().sum::<f64>() / fit.scores.len() as f64;
        let max = fit.scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let score = clamp_score((mean + max) / 2.0 * self.scale);
        debug!(
            rows = rows.len(),
            trees = fit.trees.len(),
            outliers = fit.n_outliers(),
            mean,
            max,
            score,
            "isolation: scored"
        );
        score
    }
}

impl Default for IsolationScorer {
    fn default() -> Self {
        Self {
            forest: IsolationForest::default(),
            min_rows: MIN_MODEL_ROWS,
            fallback: ISOLATION_FALLBACK_SCORE,
            scale: ISOLATION_SCALE,
        }
    }
}

impl AnomalyScorer for IsolationScorer {
    fn name(&self) -> &'static str {
        "isolation_forest"
    }

    fn score(&self, matrix: &FeatureMatrix, seed: u64) -> f64 {
        self.score_rows(&model_rows(matrix, self.name()), seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myrisk_core::constants::DEFAULT_SEED;
    use proptest::prelude::*;

    fn cloud(n: usize) -> Vec<Vec<f64>> {
        (0..n)
            .map(|i| vec![(i % 7) as f64, ((i * 3) % 11) as f64, (i % 5) as f64 * 0.5])
            .collect()
    }

    // --- average_path_length ---

    #[test]
    fn average_path_length_small_values() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!(average_path_length(256) > average_path_length(16));
    }

    #[test]
    fn quantile_interpolates() {
        assert_eq!(quantile(&[4.0, 1.0, 3.0, 2.0], 0.5), 2.5);
        assert_eq!(quantile(&[1.0, 2.0], 1.0), 2.0);
        assert_eq!(quantile(&[], 0.9), 0.0);
    }

    // --- IsolationForest ---

    #[test]
    fn same_seed_same_scores() {
        let rows = cloud(40);
        let forest = IsolationForest::default();
        let a = forest.fit(&rows, DEFAULT_SEED);
        let b = forest.fit(&rows, DEFAULT_SEED);
        assert_eq!(a.scores, b.scores);
        assert_eq!(a.threshold, b.threshold);
    }

    #[test]
    fn far_row_scores_highest() {
        let mut rows = cloud(60);
        rows.push(vec![500.0, -500.0, 250.0]);
        let fit = IsolationForest::default().fit(&rows, DEFAULT_SEED);
        let far = fit.scores[60];
        assert!(fit.scores[..60].iter().all(|s| *s < far));
        assert_eq!(fit.labels()[60], -1);
    }

    #[test]
    fn scores_are_in_unit_interval() {
        let fit = IsolationForest::default().fit(&cloud(30), 7);
        assert!(fit.scores.iter().all(|s| *s > 0.0 && *s <= 1.0));
    }

    #[test]
    fn contamination_bounds_outlier_share() {
        let fit = IsolationForest::default().fit(&cloud(100), DEFAULT_SEED);
        assert!(fit.n_outliers() <= 10);
    }

    #[test]
    fn constant_rows_are_all_leaves() {
        let rows = vec![vec![1.0, 1.0]; 20];
        let fit = IsolationForest::default().fit(&rows, DEFAULT_SEED);
        let first = fit.scores[0];
        assert!(fit.scores.iter().all(|s| *s == first));
        assert_eq!(fit.n_outliers(), 0);
    }

    // --- IsolationScorer ---

    #[test]
    fn small_sample_uses_fallback() {
        let scorer = IsolationScorer::default();
        assert_eq!(scorer.score_rows(&cloud(9), DEFAULT_SEED), ISOLATION_FALLBACK_SCORE);
    }

    #[test]
    fn extreme_row_does_not_lower_score() {
        let base = cloud(50);
        let mut spiked = base.clone();
        spiked[11] = spiked[11].iter().map(|v| v * 1_000.0 + 1_000.0).collect();
        let scorer = IsolationScorer::default();
        let before = scorer.score_rows(&base, DEFAULT_SEED);
        let after = scorer.score_rows(&spiked, DEFAULT_SEED);
        assert!(after >= before, "{after} < {before}");
    }

    #[test]
    fn matrix_score_uses_complete_rows() {
        let mut a: Vec<f64> = (0..20).map(|i| (i % 6) as f64).collect();
        a[4] = f64::NAN;
        let b: Vec<f64> = (0..20).map(|i| (i % 4) as f64 * 2.0).collect();
        let m = FeatureMatrix::from_pairs([("a", a), ("b", b)]).unwrap();
        let s = IsolationScorer::default().score(&m, DEFAULT_SEED);
        assert!((0.0..=100.0).contains(&s));
        assert_ne!(s, ISOLATION_FALLBACK_SCORE);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn bounded_and_reproducible(
            rows in proptest::collection::vec(
                proptest::collection::vec(-1e4f64..1e4, 2),
                10..40,
            ),
            seed in any::<u64>(),
        ) {
            let scorer = IsolationScorer::default();
            let a = scorer.score_rows(&rows, seed);
            let b = scorer.score_rows(&rows, seed);
            prop_assert!((0.0..=100.0).contains(&a));
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}
